//! Selection document types.
//!
//! These serialize to the exact JSON layout of a `.selections.json` file:
//!
//! ```json
//! {
//!   "folderPath": "/shoots/wedding",
//!   "lastAccessed": 1718000000000,
//!   "selections": [
//!     {"photoPath": "/shoots/wedding/IMG_1.CR3", "status": "KEEP",
//!      "lastModified": 1717990000000, "fileSize": 25123456}
//!   ],
//!   "totalPhotos": 1,
//!   "thumbnailHashes": ["5f0c..."],
//!   "cacheVersion": 2
//! }
//! ```

use crate::core::address::{ContentAddress, FileStamp};
use crate::core::scanner::PhotoStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version written into every document. Older documents get their hash
/// lists rebuilt by repair.
pub const CACHE_VERSION: u32 = 2;

/// Decision for one photo plus the stamp of its primary file at save time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRecord {
    pub photo_path: PathBuf,
    pub status: PhotoStatus,
    /// Epoch milliseconds
    pub last_modified: i64,
    pub file_size: u64,
}

impl SelectionRecord {
    pub fn new(photo_path: PathBuf, status: PhotoStatus, stamp: FileStamp) -> Self {
        Self {
            photo_path,
            status,
            last_modified: stamp.modified_ms,
            file_size: stamp.size,
        }
    }

    pub fn stamp(&self) -> FileStamp {
        FileStamp {
            modified_ms: self.last_modified,
            size: self.file_size,
        }
    }
}

/// Persisted state of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSelections {
    pub folder_path: PathBuf,
    /// Epoch milliseconds
    pub last_accessed: i64,
    pub selections: Vec<SelectionRecord>,
    pub total_photos: usize,
    /// Addresses of every artifact this project owns
    #[serde(default)]
    pub thumbnail_hashes: Vec<ContentAddress>,
    #[serde(default)]
    pub cache_version: u32,
}

impl FolderSelections {
    /// Whether repair has to look at this document
    pub fn needs_repair(&self) -> bool {
        self.cache_version != CACHE_VERSION
            || (self.thumbnail_hashes.is_empty() && !self.selections.is_empty())
    }

    pub fn count(&self, status: PhotoStatus) -> usize {
        self.selections.iter().filter(|r| r.status == status).count()
    }
}

/// Registry row for one cached project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedProjectSummary {
    pub folder_path: PathBuf,
    pub folder_name: String,
    /// Epoch milliseconds
    pub last_accessed: i64,
    pub total_photos: usize,
    pub kept_count: usize,
    pub discarded_count: usize,
    pub remaining_count: usize,
}

impl From<&FolderSelections> for CachedProjectSummary {
    fn from(doc: &FolderSelections) -> Self {
        let kept_count = doc.count(PhotoStatus::Keep);
        let discarded_count = doc.count(PhotoStatus::Discard);
        let folder_name = doc
            .folder_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| doc.folder_path.to_string_lossy().into_owned());

        Self {
            folder_path: doc.folder_path.clone(),
            folder_name,
            last_accessed: doc.last_accessed,
            total_photos: doc.total_photos,
            kept_count,
            discarded_count,
            remaining_count: doc
                .total_photos
                .saturating_sub(kept_count)
                .saturating_sub(discarded_count),
        }
    }
}

/// What a repair pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    pub documents_checked: usize,
    pub documents_rewritten: usize,
    pub orphans_removed: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.documents_rewritten == 0 && self.orphans_removed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> FolderSelections {
        FolderSelections {
            folder_path: PathBuf::from("/shoots/wedding"),
            last_accessed: 1_718_000_000_000,
            selections: vec![
                SelectionRecord {
                    photo_path: PathBuf::from("/shoots/wedding/a.CR3"),
                    status: PhotoStatus::Keep,
                    last_modified: 1,
                    file_size: 10,
                },
                SelectionRecord {
                    photo_path: PathBuf::from("/shoots/wedding/b.CR3"),
                    status: PhotoStatus::Discard,
                    last_modified: 2,
                    file_size: 20,
                },
            ],
            total_photos: 5,
            thumbnail_hashes: vec![ContentAddress::from_hex("ab")],
            cache_version: CACHE_VERSION,
        }
    }

    #[test]
    fn serializes_with_camel_case_field_names() {
        let json = serde_json::to_value(document()).unwrap();

        assert_eq!(json["folderPath"], "/shoots/wedding");
        assert_eq!(json["totalPhotos"], 5);
        assert_eq!(json["cacheVersion"], CACHE_VERSION);
        assert_eq!(json["thumbnailHashes"][0], "ab");
        assert_eq!(json["selections"][0]["photoPath"], "/shoots/wedding/a.CR3");
        assert_eq!(json["selections"][0]["status"], "KEEP");
        assert_eq!(json["selections"][1]["lastModified"], 2);
        assert_eq!(json["selections"][1]["fileSize"], 20);
    }

    #[test]
    fn document_without_version_or_hashes_needs_repair() {
        let json = r#"{
            "folderPath": "/p",
            "lastAccessed": 0,
            "selections": [{"photoPath": "/p/a.jpg", "status": "UNDECIDED", "lastModified": 0, "fileSize": 0}],
            "totalPhotos": 1
        }"#;
        let doc: FolderSelections = serde_json::from_str(json).unwrap();

        assert_eq!(doc.cache_version, 0);
        assert!(doc.thumbnail_hashes.is_empty());
        assert!(doc.needs_repair());
        assert!(!document().needs_repair());
    }

    #[test]
    fn summary_counts_decisions() {
        let summary = CachedProjectSummary::from(&document());

        assert_eq!(summary.folder_name, "wedding");
        assert_eq!(summary.kept_count, 1);
        assert_eq!(summary.discarded_count, 1);
        assert_eq!(summary.remaining_count, 3);
    }

    #[test]
    fn remaining_never_underflows() {
        let mut doc = document();
        doc.total_photos = 1;
        assert_eq!(CachedProjectSummary::from(&doc).remaining_count, 0);
    }
}
