//! Copying and deleting backing files.

use crate::error::TransferError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How discarded files are removed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Move to the system trash (recoverable)
    #[default]
    Trash,
    /// Unlink immediately
    Permanent,
}

/// What a transfer did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferReport {
    /// Files copied or deleted
    pub files: usize,
    pub total_size_bytes: u64,
    pub duration_ms: u64,
}

/// File operations behind export and delete.
///
/// Implementations are best effort: every file is attempted and nothing
/// already done is rolled back. Any per-file failure makes the whole call
/// return [`TransferError::Incomplete`].
pub trait FileTransfer: Send + Sync {
    /// Copy files into `destination`, keeping their names
    fn copy_files(
        &self,
        files: &[PathBuf],
        destination: &Path,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<TransferReport, TransferError>;

    /// Delete files
    fn delete_files(
        &self,
        files: &[PathBuf],
        mode: DeleteMode,
    ) -> Result<TransferReport, TransferError>;
}

/// Default [`FileTransfer`] on top of `std::fs` and the `trash` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct BestEffortTransfer;

/// Progress every file or 100ms, whichever is rarer
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

impl BestEffortTransfer {
    fn finish(
        errors: Vec<String>,
        total: usize,
        report: TransferReport,
    ) -> Result<TransferReport, TransferError> {
        match errors.into_iter().next() {
            None => Ok(report),
            Some(first) => Err(TransferError::Incomplete {
                failed: total - report.files,
                total,
                first,
            }),
        }
    }

    fn delete_one(path: &Path, mode: DeleteMode) -> Result<(), TransferError> {
        if !path.exists() {
            return Err(TransferError::SourceMissing {
                path: path.to_path_buf(),
            });
        }

        match mode {
            DeleteMode::Permanent => fs::remove_file(path).map_err(|e| TransferError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
            DeleteMode::Trash => trash::delete(path).map_err(|e| TransferError::Trash {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}

impl FileTransfer for BestEffortTransfer {
    fn copy_files(
        &self,
        files: &[PathBuf],
        destination: &Path,
        on_progress: &mut dyn FnMut(usize, usize),
    ) -> Result<TransferReport, TransferError> {
        let start = Instant::now();
        fs::create_dir_all(destination).map_err(|_| TransferError::DestinationInvalid {
            path: destination.to_path_buf(),
        })?;
        if !destination.is_dir() {
            return Err(TransferError::DestinationInvalid {
                path: destination.to_path_buf(),
            });
        }

        let total = files.len();
        let mut report = TransferReport::default();
        let mut errors = Vec::new();
        let mut last_progress = Instant::now();

        for (i, source) in files.iter().enumerate() {
            let now = Instant::now();
            if now.duration_since(last_progress) >= PROGRESS_INTERVAL {
                on_progress(i, total);
                last_progress = now;
            }

            let Some(name) = source.file_name() else {
                errors.push(format!("{}: not a file", source.display()));
                continue;
            };
            if !source.is_file() {
                errors.push(
                    TransferError::SourceMissing {
                        path: source.clone(),
                    }
                    .to_string(),
                );
                continue;
            }

            match fs::copy(source, destination.join(name)) {
                Ok(bytes) => {
                    report.files += 1;
                    report.total_size_bytes += bytes;
                }
                Err(e) => errors.push(format!("{}: {}", source.display(), e)),
            }
        }

        on_progress(total, total);
        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Copied {} of {} files to {}",
            report.files,
            total,
            destination.display()
        );
        Self::finish(errors, total, report)
    }

    fn delete_files(
        &self,
        files: &[PathBuf],
        mode: DeleteMode,
    ) -> Result<TransferReport, TransferError> {
        let start = Instant::now();
        let total = files.len();
        let mut report = TransferReport::default();
        let mut errors = Vec::new();

        for path in files {
            let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
            match Self::delete_one(path, mode) {
                Ok(()) => {
                    report.files += 1;
                    report.total_size_bytes += size;
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!("Deleted {} of {} files ({:?})", report.files, total, mode);
        Self::finish(errors, total, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn copy_keeps_originals_and_names() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let files = vec![file(&src, "a.cr3", b"raw"), file(&src, "a.jpg", b"jpeg")];

        let mut last = (0, 0);
        let report = BestEffortTransfer
            .copy_files(&files, &dest.path().join("keepers"), &mut |d, t| last = (d, t))
            .unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.total_size_bytes, 7);
        assert_eq!(last, (2, 2));
        assert!(files.iter().all(|f| f.exists()));
        assert!(dest.path().join("keepers/a.cr3").exists());
        assert!(dest.path().join("keepers/a.jpg").exists());
    }

    #[test]
    fn copy_with_missing_source_is_incomplete_but_copies_the_rest() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let files = vec![src.path().join("gone.jpg"), file(&src, "b.jpg", b"b")];

        let result = BestEffortTransfer.copy_files(&files, dest.path(), &mut |_, _| {});

        assert!(matches!(
            result,
            Err(TransferError::Incomplete {
                failed: 1,
                total: 2,
                ..
            })
        ));
        assert!(dest.path().join("b.jpg").exists());
    }

    #[test]
    fn copy_into_a_file_is_rejected() {
        let src = TempDir::new().unwrap();
        let blocker = file(&src, "not-a-dir", b"x");

        let result = BestEffortTransfer.copy_files(&[], &blocker, &mut |_, _| {});
        assert!(matches!(result, Err(TransferError::DestinationInvalid { .. })));
    }

    #[test]
    fn permanent_delete_removes_files() {
        let src = TempDir::new().unwrap();
        let files = vec![file(&src, "a.nef", b"raw"), file(&src, "a.jpg", b"jpg")];

        let report = BestEffortTransfer
            .delete_files(&files, DeleteMode::Permanent)
            .unwrap();

        assert_eq!(report.files, 2);
        assert!(files.iter().all(|f| !f.exists()));
    }

    #[test]
    fn deleting_missing_file_is_reported() {
        let src = TempDir::new().unwrap();
        let result = BestEffortTransfer
            .delete_files(&[src.path().join("gone.jpg")], DeleteMode::Permanent);
        assert!(matches!(result, Err(TransferError::Incomplete { failed: 1, .. })));
    }
}
