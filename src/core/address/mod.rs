//! # Address Module
//!
//! Stable identity of a photo's current on-disk state.
//!
//! A [`ContentAddress`] is a digest of the source file's absolute path,
//! modification time and size. It names cache artifacts, so editing or
//! replacing a photo automatically points the cache at fresh renditions.
//! Collision resistance is not a goal, only change detection.

use crate::core::paths::absolute_path;
use crate::core::scanner::Photo;
use crate::error::AddressError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;
use xxhash_rust::xxh3::xxh3_128;

/// Modification time and size of a file, as recorded in selection documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    /// Last modification, milliseconds since the Unix epoch
    pub modified_ms: i64,
    /// Length in bytes
    pub size: u64,
}

impl FileStamp {
    /// Read the stamp of a file
    pub fn read(path: &Path) -> Result<Self, AddressError> {
        let metadata = fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AddressError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                AddressError::Metadata {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        Ok(Self {
            modified_ms,
            size: metadata.len(),
        })
    }
}

/// 32-character hex digest naming a photo's cache artifacts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Address of the file renditions are generated from
    pub fn for_photo(photo: &Photo) -> Result<Self, AddressError> {
        Self::for_file(photo.source_path())
    }

    /// Address of a single file
    pub fn for_file(path: &Path) -> Result<Self, AddressError> {
        let stamp = FileStamp::read(path)?;
        Ok(Self::from_stamp(path, stamp))
    }

    /// Address a file had (or has) at a given stamp, without touching the disk
    pub fn from_stamp(path: &Path, stamp: FileStamp) -> Self {
        let absolute = absolute_path(path);
        let key = format!(
            "{}_{}_{}",
            absolute.to_string_lossy(),
            stamp.modified_ms,
            stamp.size
        );
        Self(format!("{:032x}", xxh3_128(key.as_bytes())))
    }

    /// Wrap a digest read back from a selection document
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn address_is_fixed_length_hex() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.jpg", b"pixels");

        let address = ContentAddress::for_file(&path).unwrap();

        assert_eq!(address.as_str().len(), 32);
        assert!(address.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn unchanged_file_keeps_its_address() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.jpg", b"pixels");

        let first = ContentAddress::for_file(&path).unwrap();
        let second = ContentAddress::for_file(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn size_change_changes_address() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.jpg", b"pixels");
        let before = ContentAddress::for_file(&path).unwrap();

        fs::write(&path, b"more pixels").unwrap();
        let after = ContentAddress::for_file(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn mtime_change_changes_address() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.jpg", b"pixels");
        let before = ContentAddress::for_file(&path).unwrap();

        let file = fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(120))
            .unwrap();
        drop(file);

        let after = ContentAddress::for_file(&path).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn recorded_stamp_reproduces_old_address() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.jpg", b"pixels");
        let stamp = FileStamp::read(&path).unwrap();
        let before = ContentAddress::for_file(&path).unwrap();

        fs::write(&path, b"retouched pixels").unwrap();

        assert_eq!(ContentAddress::from_stamp(&path, stamp), before);
        assert_ne!(ContentAddress::for_file(&path).unwrap(), before);
    }

    #[test]
    fn same_content_in_different_files_differs() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.jpg", b"same");
        let b = write(&dir, "b.jpg", b"same");

        assert_ne!(
            ContentAddress::for_file(&a).unwrap(),
            ContentAddress::for_file(&b).unwrap()
        );
    }

    #[test]
    fn photo_address_prefers_processed_file() {
        let dir = TempDir::new().unwrap();
        let raw = write(&dir, "p.cr3", b"raw");
        let jpg = write(&dir, "p.jpg", b"jpg");
        let photo = Photo::from_paths(Some(raw), Some(jpg.clone())).unwrap();

        assert_eq!(
            ContentAddress::for_photo(&photo).unwrap(),
            ContentAddress::for_file(&jpg).unwrap()
        );
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let result = ContentAddress::for_file(Path::new("/nonexistent/x.jpg"));
        assert!(matches!(result, Err(AddressError::FileNotFound { .. })));
    }
}
