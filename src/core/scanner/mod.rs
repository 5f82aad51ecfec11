//! # Scanner Module
//!
//! Turns a source folder into the list of photos to cull.
//!
//! A photo is a RAW file, a processed image (JPEG, PNG, ...), or a RAW and a
//! processed image sharing a file stem (`IMG_0042.CR3` + `IMG_0042.JPG`).
//! Anything else in the folder is reported back as skipped.
//!
//! ## Example
//! ```rust,ignore
//! use fotofilter::core::scanner::{FolderScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan("/Users/ana/Shoots/2024-06-01".as_ref())?;
//! println!("{} photos, {} skipped", result.photos.len(), result.skipped.len());
//! ```

mod filter;
mod walker;

pub use filter::{FileKind, PhotoFilter};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::{null_sender, EventSender};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Culling decision for one photo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhotoStatus {
    #[default]
    Undecided,
    Keep,
    Discard,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undecided => "UNDECIDED",
            Self::Keep => "KEEP",
            Self::Discard => "DISCARD",
        }
    }
}

/// Backing files of a photo. At least one file always exists by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoFiles {
    Raw(PathBuf),
    Processed(PathBuf),
    Pair { raw: PathBuf, processed: PathBuf },
}

/// A photo being culled
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    files: PhotoFiles,
    /// Display name (file stem)
    pub name: String,
    /// Creation time of the primary file
    pub created_at: DateTime<Utc>,
    /// Current decision
    pub status: PhotoStatus,
}

impl Photo {
    /// Build a photo, reading the creation time from the primary file
    pub fn new(files: PhotoFiles) -> Self {
        let primary = match &files {
            PhotoFiles::Raw(raw) | PhotoFiles::Pair { raw, .. } => raw,
            PhotoFiles::Processed(processed) => processed,
        };
        let name = primary
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let created_at = file_created_at(primary);

        Self {
            files,
            name,
            created_at,
            status: PhotoStatus::Undecided,
        }
    }

    /// Build a photo from optional paths; `None` when both are missing
    pub fn from_paths(raw: Option<PathBuf>, processed: Option<PathBuf>) -> Option<Self> {
        let files = match (raw, processed) {
            (Some(raw), Some(processed)) => PhotoFiles::Pair { raw, processed },
            (Some(raw), None) => PhotoFiles::Raw(raw),
            (None, Some(processed)) => PhotoFiles::Processed(processed),
            (None, None) => return None,
        };
        Some(Self::new(files))
    }

    pub fn with_status(mut self, status: PhotoStatus) -> Self {
        self.status = status;
        self
    }

    pub fn files(&self) -> &PhotoFiles {
        &self.files
    }

    pub fn raw_path(&self) -> Option<&Path> {
        match &self.files {
            PhotoFiles::Raw(raw) | PhotoFiles::Pair { raw, .. } => Some(raw),
            PhotoFiles::Processed(_) => None,
        }
    }

    pub fn processed_path(&self) -> Option<&Path> {
        match &self.files {
            PhotoFiles::Processed(processed) | PhotoFiles::Pair { processed, .. } => {
                Some(processed)
            }
            PhotoFiles::Raw(_) => None,
        }
    }

    /// Identity of the photo: the RAW file if there is one
    pub fn primary_path(&self) -> &Path {
        match &self.files {
            PhotoFiles::Raw(raw) | PhotoFiles::Pair { raw, .. } => raw,
            PhotoFiles::Processed(processed) => processed,
        }
    }

    /// File renditions are generated from: the processed image if there is one
    pub fn source_path(&self) -> &Path {
        match &self.files {
            PhotoFiles::Processed(processed) | PhotoFiles::Pair { processed, .. } => processed,
            PhotoFiles::Raw(raw) => raw,
        }
    }

    /// Every file on disk that belongs to this photo
    pub fn backing_files(&self) -> Vec<&Path> {
        match &self.files {
            PhotoFiles::Raw(path) | PhotoFiles::Processed(path) => vec![path.as_path()],
            PhotoFiles::Pair { raw, processed } => vec![raw.as_path(), processed.as_path()],
        }
    }
}

fn file_created_at(path: &Path) -> DateTime<Utc> {
    fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

/// Result of scanning one folder
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Photos sorted by name
    pub photos: Vec<Photo>,
    /// Names of files that are not photos
    pub skipped: Vec<String>,
}

/// Folder-scan collaborator
///
/// Implement this trait to plug in a different discovery strategy.
pub trait FolderScanner: Send + Sync {
    /// Scan a folder
    fn scan(&self, folder: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(folder, &null_sender())
    }

    /// Scan a folder, reporting through events
    fn scan_with_events(
        &self,
        folder: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_uses_raw_as_identity_and_processed_as_source() {
        let photo = Photo::from_paths(
            Some(PathBuf::from("/s/IMG_1.CR3")),
            Some(PathBuf::from("/s/IMG_1.JPG")),
        )
        .unwrap();

        assert_eq!(photo.primary_path(), Path::new("/s/IMG_1.CR3"));
        assert_eq!(photo.source_path(), Path::new("/s/IMG_1.JPG"));
        assert_eq!(photo.name, "IMG_1");
        assert_eq!(photo.backing_files().len(), 2);
    }

    #[test]
    fn photo_requires_a_file() {
        assert!(Photo::from_paths(None, None).is_none());
    }

    #[test]
    fn processed_only_photo() {
        let photo = Photo::from_paths(None, Some(PathBuf::from("/s/a.jpg"))).unwrap();
        assert_eq!(photo.primary_path(), photo.source_path());
        assert!(photo.raw_path().is_none());
        assert_eq!(photo.status, PhotoStatus::Undecided);
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&PhotoStatus::Keep).unwrap(), "\"KEEP\"");
        let parsed: PhotoStatus = serde_json::from_str("\"DISCARD\"").unwrap();
        assert_eq!(parsed, PhotoStatus::Discard);
    }
}
