//! # Cache Module
//!
//! Disk cache of derived JPEG renditions (thumbnails and previews).
//!
//! ## Benefits
//! - Re-opening a folder shows thumbnails immediately
//! - Only new or modified photos are decoded again
//! - Invalidation is free: an edited file gets a new content address
//!
//! ## Layout
//! One directory per project (source folder) under `<root>/thumbnails`, each
//! holding `thumb_<address>.jpg` and `preview_<address>.jpg` files.
//!
//! ## Backends
//! - `DerivedImageCache` - the disk cache, source of truth
//! - `RecentImages` - advisory in-memory layer, safe to clear at any time

mod memory;
mod store;

pub use memory::RecentImages;
pub use store::DerivedImageCache;

use crate::core::address::ContentAddress;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which rendition an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Thumbnail,
    Preview,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Thumbnail, ArtifactKind::Preview];

    /// File name prefix of this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumb",
            Self::Preview => "preview",
        }
    }

    /// `thumb_<address>.jpg` / `preview_<address>.jpg`
    pub fn file_name(&self, address: &ContentAddress) -> String {
        format!("{}_{}.jpg", self.prefix(), address)
    }

    /// Inverse of [`ArtifactKind::file_name`]
    pub fn parse_file_name(name: &str) -> Option<(Self, ContentAddress)> {
        let stem = name.strip_suffix(".jpg")?;
        let (prefix, hash) = stem.split_once('_')?;
        let kind = Self::ALL.into_iter().find(|k| k.prefix() == prefix)?;
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some((kind, ContentAddress::from_hex(hash)))
    }
}

/// A rendition read from or written to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub kind: ArtifactKind,
    pub address: ContentAddress,
    /// Location on disk
    pub path: PathBuf,
    /// Encoded JPEG
    pub bytes: Vec<u8>,
}

/// Cache statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of project directories
    pub projects: usize,
    /// Number of artifact files
    pub artifacts: usize,
    /// Total size of artifact files in bytes
    pub total_size_bytes: u64,
}

/// A photo whose renditions could not be produced during import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Photos that got at least one new artifact
    pub generated: usize,
    /// Photos that were fully cached already
    pub already_cached: usize,
    pub failures: Vec<ImportFailure>,
}

impl ImportSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.generated + self.already_cached + self.failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        let address = ContentAddress::from_hex("0123456789abcdef0123456789abcdef");
        for kind in ArtifactKind::ALL {
            let name = kind.file_name(&address);
            assert_eq!(ArtifactKind::parse_file_name(&name), Some((kind, address.clone())));
        }
    }

    #[test]
    fn thumbnail_file_name_layout() {
        let address = ContentAddress::from_hex("ab12");
        assert_eq!(ArtifactKind::Thumbnail.file_name(&address), "thumb_ab12.jpg");
        assert_eq!(ArtifactKind::Preview.file_name(&address), "preview_ab12.jpg");
    }

    #[test]
    fn foreign_files_are_not_artifacts() {
        assert!(ArtifactKind::parse_file_name("thumb_ab12.png").is_none());
        assert!(ArtifactKind::parse_file_name("cover_ab12.jpg").is_none());
        assert!(ArtifactKind::parse_file_name("thumb_.jpg").is_none());
        assert!(ArtifactKind::parse_file_name(".DS_Store").is_none());
        assert!(ArtifactKind::parse_file_name("thumb_xyz.jpg").is_none());
    }

    #[test]
    fn summary_total_counts_failures() {
        let summary = ImportSummary {
            generated: 2,
            already_cached: 1,
            failures: vec![ImportFailure {
                path: PathBuf::from("/s/bad.jpg"),
                message: "corrupt".to_string(),
            }],
        };
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total(), 4);
    }
}
