//! JSON-file selection store.

use super::types::{
    CachedProjectSummary, FolderSelections, RepairReport, SelectionRecord, CACHE_VERSION,
};
use crate::core::address::{ContentAddress, FileStamp};
use crate::core::cache::DerivedImageCache;
use crate::core::paths::{absolute_path, AppPaths};
use crate::core::scanner::{
    FileKind, FolderScanner, Photo, PhotoFilter, PhotoStatus, WalkDirScanner,
};
use crate::error::SelectionError;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// One selection document per project under `<root>/cache`.
///
/// Every public operation is total: document errors are logged and the
/// operation continues with the next document or returns a safe default.
pub struct SelectionStore {
    paths: AppPaths,
    cache: Arc<DerivedImageCache>,
}

impl SelectionStore {
    pub fn new(paths: AppPaths, cache: Arc<DerivedImageCache>) -> Self {
        Self { paths, cache }
    }

    pub fn document_path(&self, folder: &Path) -> PathBuf {
        self.paths.selections_file(folder)
    }

    /// Persist the status of every photo in a folder.
    ///
    /// The hash list of an existing document is kept, not recomputed. Current
    /// addresses missing from it are appended, and the old address of a
    /// standalone processed file that was edited is dropped so its stale
    /// renditions become orphans.
    pub fn save_selections(&self, folder: &Path, photos: &[Photo]) -> bool {
        match self.try_save(folder, photos) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to save selections for {}: {}", folder.display(), e);
                false
            }
        }
    }

    fn try_save(&self, folder: &Path, photos: &[Photo]) -> Result<(), SelectionError> {
        let path = self.document_path(folder);
        let prior = self.read_or_discard(&path);

        let mut selections = Vec::with_capacity(photos.len());
        let mut stamps = HashMap::with_capacity(photos.len());
        for photo in photos {
            let primary = absolute_path(photo.primary_path());
            match FileStamp::read(&primary) {
                Ok(stamp) => {
                    stamps.insert(primary.clone(), stamp);
                    selections.push(SelectionRecord::new(primary, photo.status, stamp));
                }
                Err(e) => tracing::debug!("Not recording {}: {}", primary.display(), e),
            }
        }

        let thumbnail_hashes = match prior {
            Some(prior) => merge_hashes(&prior, photos, &stamps),
            None => addresses_of(photos),
        };

        let document = FolderSelections {
            folder_path: absolute_path(folder),
            last_accessed: Utc::now().timestamp_millis(),
            selections,
            total_photos: photos.len(),
            thumbnail_hashes,
            cache_version: CACHE_VERSION,
        };

        write_document(&path, &document)?;
        tracing::debug!(
            "Saved {} selections to {}",
            document.selections.len(),
            path.display()
        );
        Ok(())
    }

    /// Apply stored decisions to freshly scanned photos.
    ///
    /// A decision only survives if the primary file still has the stamp it
    /// had when the decision was saved; otherwise the photo is Undecided.
    pub fn load_selections(&self, folder: &Path, photos: Vec<Photo>) -> Vec<Photo> {
        let path = self.document_path(folder);
        let document = match read_document(&path) {
            Ok(Some(document)) => document,
            Ok(None) => return photos,
            Err(e) => {
                tracing::warn!("Ignoring selections for {}: {}", folder.display(), e);
                return photos;
            }
        };

        let records: HashMap<&Path, &SelectionRecord> = document
            .selections
            .iter()
            .map(|r| (r.photo_path.as_path(), r))
            .collect();

        photos
            .into_iter()
            .map(|photo| {
                let primary = absolute_path(photo.primary_path());
                let Some(record) = records.get(primary.as_path()) else {
                    return photo;
                };

                match FileStamp::read(&primary) {
                    Ok(stamp) if stamp == record.stamp() => photo.with_status(record.status),
                    _ => {
                        tracing::debug!("{} changed since last session", primary.display());
                        photo.with_status(PhotoStatus::Undecided)
                    }
                }
            })
            .collect()
    }

    /// Remove a folder's document, keeping its artifacts
    pub fn delete_selections(&self, folder: &Path) -> bool {
        remove_document(&self.document_path(folder))
    }

    /// Drop projects not opened for `max_age_days`, then sweep orphans.
    ///
    /// Returns the number of documents removed.
    pub fn cleanup_old_selections(&self, max_age_days: u32) -> usize {
        let cutoff = Utc::now().timestamp_millis() - i64::from(max_age_days) * DAY_MS;
        let mut removed = 0;

        for path in self.document_files() {
            let document = match read_document(&path) {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            if document.last_accessed < cutoff {
                tracing::info!(
                    "Removing stale project {} (last opened {})",
                    document.folder_path.display(),
                    document.last_accessed
                );
                self.remove_project_artifacts(&document);
                if remove_document(&path) {
                    removed += 1;
                }
            }
        }

        self.sweep_orphans();
        removed
    }

    /// Summaries of every project whose folder still exists, most recent first.
    ///
    /// Documents of vanished folders are deleted with their artifacts, and
    /// unparsable documents are deleted.
    pub fn list_cached_projects(&self) -> Vec<CachedProjectSummary> {
        let mut projects = Vec::new();

        for path in self.document_files() {
            match read_document(&path) {
                Ok(Some(document)) if document.folder_path.is_dir() => {
                    projects.push(CachedProjectSummary::from(&document));
                }
                Ok(Some(document)) => {
                    tracing::info!(
                        "Forgetting {}: folder no longer exists",
                        document.folder_path.display()
                    );
                    self.remove_project_artifacts(&document);
                    remove_document(&path);
                }
                Ok(None) => {}
                Err(e @ SelectionError::DocumentCorrupt { .. }) => {
                    tracing::warn!("Deleting corrupt document: {}", e);
                    remove_document(&path);
                }
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        projects.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        projects
    }

    /// Forget a project: its listed artifacts, its artifact directory and its document
    pub fn delete_cached_project(&self, folder: &Path) -> bool {
        let path = self.document_path(folder);
        match read_document(&path) {
            Ok(Some(document)) => self.remove_project_artifacts(&document),
            Ok(None) => {
                self.cache.cleanup_project(folder);
            }
            Err(e) => {
                tracing::warn!("Deleting unreadable document for {}: {}", folder.display(), e);
                self.cache.cleanup_project(folder);
            }
        }
        remove_document(&path)
    }

    /// Bring every document to the current version, then sweep orphans.
    ///
    /// Hash lists are rebuilt from the recorded photo paths only when the
    /// version is old or the list is empty, and a document is rewritten only
    /// when something actually changed, so a second run is a no-op.
    pub fn validate_and_repair_cache(&self) -> RepairReport {
        let mut report = RepairReport::default();

        for path in self.document_files() {
            let mut document = match read_document(&path) {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Cannot repair {}: {}", path.display(), e);
                    continue;
                }
            };
            report.documents_checked += 1;

            if !document.needs_repair() {
                continue;
            }

            let hashes = rebuild_hashes(&document);
            if document.cache_version == CACHE_VERSION && hashes == document.thumbnail_hashes {
                continue;
            }

            document.thumbnail_hashes = hashes;
            document.cache_version = CACHE_VERSION;
            match write_document(&path, &document) {
                Ok(()) => {
                    tracing::info!("Repaired {}", path.display());
                    report.documents_rewritten += 1;
                }
                Err(e) => tracing::warn!("Failed to repair {}: {}", path.display(), e),
            }
        }

        report.orphans_removed = self.sweep_orphans();
        report
    }

    /// Delete artifacts no document lists, and empty project directories.
    ///
    /// Returns the number of artifact files removed.
    pub fn sweep_orphans(&self) -> usize {
        let referenced: HashSet<ContentAddress> = self
            .document_files()
            .iter()
            .filter_map(|path| read_document(path).ok().flatten())
            .flat_map(|document| document.thumbnail_hashes)
            .collect();

        let mut removed = 0;
        for (path, address) in self.cache.artifact_files() {
            if referenced.contains(&address) {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!("Failed to remove orphan {}: {}", path.display(), e),
            }
        }

        let dirs = self.cache.remove_empty_project_dirs();
        if removed > 0 || dirs > 0 {
            tracing::info!("Removed {} orphaned artifacts and {} empty directories", removed, dirs);
        }
        removed
    }

    fn remove_project_artifacts(&self, document: &FolderSelections) {
        let removed = self
            .cache
            .remove_artifacts(&document.folder_path, &document.thumbnail_hashes);
        tracing::debug!(
            "Removed {} artifacts of {}",
            removed,
            document.folder_path.display()
        );
        self.cache.cleanup_project(&document.folder_path);
    }

    /// Read a document, treating a corrupt one as absent
    fn read_or_discard(&self, path: &Path) -> Option<FolderSelections> {
        match read_document(path) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Replacing unreadable document: {}", e);
                None
            }
        }
    }

    fn document_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.paths.selections_dir()) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && AppPaths::is_selections_file(path))
            .collect();
        files.sort();
        files
    }
}

fn addresses_of(photos: &[Photo]) -> Vec<ContentAddress> {
    let mut seen = HashSet::new();
    photos
        .iter()
        .filter_map(|photo| ContentAddress::for_photo(photo).ok())
        .filter(|address| seen.insert(address.clone()))
        .collect()
}

/// Prior hash list without superseded addresses, plus current ones not yet listed
fn merge_hashes(
    prior: &FolderSelections,
    photos: &[Photo],
    stamps: &HashMap<PathBuf, FileStamp>,
) -> Vec<ContentAddress> {
    // Only a standalone processed file is its own rendition source, so only
    // its previous address can be rebuilt from the record
    let filter = PhotoFilter::new();
    let superseded: HashSet<ContentAddress> = prior
        .selections
        .iter()
        .filter(|record| filter.classify(&record.photo_path) == FileKind::Processed)
        .filter(|record| {
            stamps
                .get(&record.photo_path)
                .is_some_and(|now| *now != record.stamp())
        })
        .map(|record| ContentAddress::from_stamp(&record.photo_path, record.stamp()))
        .collect();

    let mut hashes: Vec<ContentAddress> = prior
        .thumbnail_hashes
        .iter()
        .filter(|address| !superseded.contains(*address))
        .cloned()
        .collect();
    let mut seen: HashSet<ContentAddress> = hashes.iter().cloned().collect();
    for address in addresses_of(photos) {
        if seen.insert(address.clone()) {
            hashes.push(address);
        }
    }
    hashes
}

/// Addresses of the recorded photos as they are on disk now.
///
/// Every folder holding a record is rescanned with the import's own pairing
/// rules, so a RAW record resolves to the processed file the cache rendered.
fn rebuild_hashes(document: &FolderSelections) -> Vec<ContentAddress> {
    let scanner = WalkDirScanner::default();
    let folders: BTreeSet<&Path> = document
        .selections
        .iter()
        .filter_map(|record| record.photo_path.parent())
        .collect();

    let mut current: HashMap<PathBuf, Photo> = HashMap::new();
    for folder in folders {
        match scanner.scan(folder) {
            Ok(scan) => current.extend(
                scan.photos
                    .into_iter()
                    .map(|photo| (absolute_path(photo.primary_path()), photo)),
            ),
            Err(e) => tracing::debug!("Cannot rescan {}: {}", folder.display(), e),
        }
    }

    let photos: Vec<Photo> = document
        .selections
        .iter()
        .filter_map(|record| current.remove(&record.photo_path))
        .collect();
    addresses_of(&photos)
}

fn read_document(path: &Path) -> Result<Option<FolderSelections>, SelectionError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(SelectionError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| SelectionError::DocumentCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_document(path: &Path, document: &FolderSelections) -> Result<(), SelectionError> {
    let io_error = |source: std::io::Error| SelectionError::Io {
        path: path.to_path_buf(),
        source,
    };

    let json =
        serde_json::to_vec_pretty(document).map_err(|e| SelectionError::Serialize(e.to_string()))?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(io_error)?;
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(&json).map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

fn remove_document(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Failed to delete {}: {}", path.display(), e);
            false
        }
    }
}
