//! Folder scanning implementation using walkdir.

use super::{filter::PhotoFilter, FileKind, FolderScanner, Photo, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the folder scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files
    pub include_hidden: bool,
}

/// Files found for one stem
#[derive(Default)]
struct StemGroup {
    raw: Option<PathBuf>,
    processed: Option<PathBuf>,
}

/// Scans the top level of a folder and pairs RAW/processed files by stem
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: PhotoFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = PhotoFilter::new().with_hidden(config.include_hidden);
        Self { config, filter }
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Default for WalkDirScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl FolderScanner for WalkDirScanner {
    fn scan_with_events(
        &self,
        folder: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        if !folder.is_dir() {
            let error = ScanError::DirectoryNotFound {
                path: folder.to_path_buf(),
            };
            events.send(Event::Scan(ScanEvent::Failed {
                path: folder.to_path_buf(),
                message: error.to_string(),
            }));
            return Err(error);
        }

        events.send(Event::Scan(ScanEvent::Started {
            path: folder.to_path_buf(),
        }));

        let walker = WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        let mut groups: BTreeMap<String, StemGroup> = BTreeMap::new();
        let mut skipped = Vec::new();

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    if e.depth() == 0 {
                        let path = folder.to_path_buf();
                        return Err(
                            if e.io_error().map(|io| io.kind())
                                == Some(std::io::ErrorKind::PermissionDenied)
                            {
                                ScanError::PermissionDenied { path }
                            } else {
                                ScanError::ReadDirectory {
                                    path,
                                    source: std::io::Error::other(e.to_string()),
                                }
                            },
                        );
                    }
                    tracing::warn!("Skipping unreadable entry in {}: {}", folder.display(), e);
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || self.filter.is_ignored(path) {
                continue;
            }

            let kind = self.filter.classify(path);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            let slot = match kind {
                FileKind::Other => None,
                FileKind::Raw => Some(&mut groups.entry(stem).or_default().raw),
                FileKind::Processed => Some(&mut groups.entry(stem).or_default().processed),
            };

            match slot {
                Some(slot) if slot.is_none() => *slot = Some(path.to_path_buf()),
                _ => {
                    // Not a photo, or a second file of the same kind for one stem
                    let name = Self::file_name(path);
                    events.send(Event::Scan(ScanEvent::Skipped {
                        file_name: name.clone(),
                    }));
                    skipped.push(name);
                }
            }
        }

        let photos: Vec<Photo> = groups
            .into_values()
            .filter_map(|group| Photo::from_paths(group.raw, group.processed))
            .collect();

        tracing::debug!(
            "Scanned {}: {} photos, {} skipped",
            folder.display(),
            photos.len(),
            skipped.len()
        );

        events.send(Event::Scan(ScanEvent::Completed {
            photos: photos.len(),
            skipped: skipped.len(),
        }));

        Ok(ScanResult { photos, skipped })
    }
}
