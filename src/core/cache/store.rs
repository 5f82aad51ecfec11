//! Disk-backed derived-image cache.

use super::{ArtifactKind, CacheStats, CachedArtifact, ImportFailure, ImportSummary};
use crate::core::address::ContentAddress;
use crate::core::imaging::{FastResizer, ImageDecoder};
use crate::core::paths::AppPaths;
use crate::core::scanner::Photo;
use crate::core::settings::Settings;
use crate::error::{CacheError, FotoFilterError};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Result of filling one photo during import
enum FillOutcome {
    Generated,
    AlreadyCached,
    Failed(ImportFailure),
}

/// Thumbnail/preview cache keyed by content address, one directory per project.
///
/// Owns the rendering worker pool. Every public operation is total: failures
/// are logged and turned into `None`, zero counts, or skipped photos.
pub struct DerivedImageCache {
    paths: AppPaths,
    settings: Settings,
    decoder: Arc<dyn ImageDecoder>,
    pool: rayon::ThreadPool,
    workers: usize,
    /// Preloads queued by `spawn_preload` and not finished yet
    in_flight: (Mutex<usize>, Condvar),
}

/// Marks one spawned preload finished, even if it panicked
struct InFlightGuard<'a>(&'a (Mutex<usize>, Condvar));

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let (count, done) = self.0;
        if let Ok(mut count) = count.lock() {
            *count = count.saturating_sub(1);
            done.notify_all();
        }
    }
}

impl DerivedImageCache {
    /// Create a cache with its own worker pool of `settings.worker_count()` threads
    pub fn new(
        paths: AppPaths,
        settings: Settings,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, FotoFilterError> {
        let settings = settings.sanitized();
        let workers = settings.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("fotofilter-render-{}", i))
            .build()
            .map_err(|e| FotoFilterError::Config(format!("Failed to start worker pool: {}", e)))?;

        Ok(Self {
            paths,
            settings,
            decoder,
            pool,
            workers,
            in_flight: (Mutex::new(0), Condvar::new()),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Artifact directory of a project
    pub fn project_dir(&self, project: &Path) -> PathBuf {
        self.paths.project_cache_dir(project)
    }

    pub fn artifact_path(
        &self,
        project: &Path,
        kind: ArtifactKind,
        address: &ContentAddress,
    ) -> PathBuf {
        self.project_dir(project).join(kind.file_name(address))
    }

    /// Thumbnail of a photo, generated on a miss
    pub fn get_thumbnail(&self, photo: &Photo, project: &Path) -> Option<CachedArtifact> {
        self.get(photo, project, ArtifactKind::Thumbnail)
    }

    /// Preview of a photo, generated on a miss
    pub fn get_preview(&self, photo: &Photo, project: &Path) -> Option<CachedArtifact> {
        self.get(photo, project, ArtifactKind::Preview)
    }

    /// Rendition of a photo; `None` when the source is missing or undecodable
    pub fn get(&self, photo: &Photo, project: &Path, kind: ArtifactKind) -> Option<CachedArtifact> {
        match self.try_get(photo, project, kind) {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                tracing::warn!("No {} for {}: {}", kind.prefix(), photo.source_path().display(), e);
                None
            }
        }
    }

    fn try_get(
        &self,
        photo: &Photo,
        project: &Path,
        kind: ArtifactKind,
    ) -> Result<CachedArtifact, CacheError> {
        let address = ContentAddress::for_photo(photo)?;
        let path = self.artifact_path(project, kind, &address);

        if let Some(bytes) = read_existing(&path)? {
            tracing::debug!("Cache hit: {}", path.display());
            return Ok(CachedArtifact {
                kind,
                address,
                path,
                bytes,
            });
        }

        let source = photo.source_path();
        let image = self.decoder.decode_with_orientation(source)?;
        let bytes = self.render(&image, kind, &path, &mut FastResizer::new(), source)?;

        Ok(CachedArtifact {
            kind,
            address,
            path,
            bytes,
        })
    }

    /// Make sure a rendition exists on disk without reading it back
    fn ensure(&self, photo: &Photo, project: &Path, kind: ArtifactKind) -> Result<(), CacheError> {
        let address = ContentAddress::for_photo(photo)?;
        let path = self.artifact_path(project, kind, &address);
        if path.is_file() {
            return Ok(());
        }

        let source = photo.source_path();
        let image = self.decoder.decode_with_orientation(source)?;
        self.render(&image, kind, &path, &mut FastResizer::new(), source)?;
        Ok(())
    }

    /// Resize, encode and atomically write one rendition
    fn render(
        &self,
        image: &DynamicImage,
        kind: ArtifactKind,
        target: &Path,
        resizer: &mut FastResizer,
        source: &Path,
    ) -> Result<Vec<u8>, CacheError> {
        let max_dim = match kind {
            ArtifactKind::Thumbnail => self.settings.thumbnail_size,
            ArtifactKind::Preview => self.settings.preview_size,
        };

        let resized = resizer.fit_within(image, max_dim, source)?;
        let bytes = encode_jpeg(&resized, self.settings.jpeg_quality, target)?;
        write_atomic(target, &bytes)?;

        tracing::debug!(
            "Generated {} {}x{} for {}",
            kind.prefix(),
            resized.width(),
            resized.height(),
            source.display()
        );
        Ok(bytes)
    }

    /// Fill both renditions of every photo not yet cached.
    ///
    /// Photos are processed in chunks of twice the worker count; chunks run
    /// one after another so at most one chunk of decoded images is alive.
    /// `on_progress(completed, total)` runs on the calling thread once per
    /// photo, failures included.
    pub fn import_folder<F>(&self, photos: &[Photo], project: &Path, mut on_progress: F) -> ImportSummary
    where
        F: FnMut(usize, usize),
    {
        let total = photos.len();
        let mut summary = ImportSummary::default();
        let mut completed = 0;
        let chunk_size = (self.workers * 2).max(1);

        tracing::info!(
            "Importing {} photos into {} with {} workers",
            total,
            self.project_dir(project).display(),
            self.workers
        );

        for chunk in photos.chunks(chunk_size) {
            let (tx, rx) = crossbeam_channel::unbounded();

            std::thread::scope(|scope| {
                scope.spawn(move || {
                    self.pool.install(|| {
                        chunk.par_iter().for_each_with(tx, |tx, photo| {
                            let _ = tx.send(self.fill(photo, project));
                        });
                    });
                });

                // Single writer: the counter only moves on this thread
                for outcome in rx.iter() {
                    completed += 1;
                    match outcome {
                        FillOutcome::Generated => summary.generated += 1,
                        FillOutcome::AlreadyCached => summary.already_cached += 1,
                        FillOutcome::Failed(failure) => summary.failures.push(failure),
                    }
                    on_progress(completed, total);
                }
            });
        }

        tracing::info!(
            "Import finished: {} generated, {} cached, {} failed",
            summary.generated,
            summary.already_cached,
            summary.failed()
        );
        summary
    }

    fn fill(&self, photo: &Photo, project: &Path) -> FillOutcome {
        match self.try_fill(photo, project) {
            Ok(true) => FillOutcome::Generated,
            Ok(false) => FillOutcome::AlreadyCached,
            Err(e) => {
                tracing::warn!("Import failed for {}: {}", photo.source_path().display(), e);
                FillOutcome::Failed(ImportFailure {
                    path: photo.source_path().to_path_buf(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Returns whether anything was generated
    fn try_fill(&self, photo: &Photo, project: &Path) -> Result<bool, CacheError> {
        let address = ContentAddress::for_photo(photo)?;
        let missing: Vec<(ArtifactKind, PathBuf)> = ArtifactKind::ALL
            .into_iter()
            .map(|kind| (kind, self.artifact_path(project, kind, &address)))
            .filter(|(_, path)| !path.is_file())
            .collect();

        if missing.is_empty() {
            return Ok(false);
        }

        // One decode serves both renditions
        let source = photo.source_path();
        let image = self.decoder.decode_with_orientation(source)?;
        let mut resizer = FastResizer::new();
        for (kind, path) in missing {
            self.render(&image, kind, &path, &mut resizer, source)?;
        }
        Ok(true)
    }

    /// Thumbnails for `center ± window`, previews for `center ± preview_radius`.
    ///
    /// Blocks until done. Per-photo failures are logged and skipped.
    pub fn preload_window(&self, photos: &[Photo], project: &Path, center: usize, window: usize) {
        let Some(thumbs) = clamped_range(photos.len(), center, window) else {
            return;
        };
        let previews = clamped_range(photos.len(), center, self.settings.preview_radius);

        let preload = |range: RangeInclusive<usize>, kind: ArtifactKind| {
            photos[range].par_iter().for_each(|photo| {
                if let Err(e) = self.ensure(photo, project, kind) {
                    tracing::warn!(
                        "Preload of {} failed for {}: {}",
                        kind.prefix(),
                        photo.source_path().display(),
                        e
                    );
                }
            });
        };

        self.pool.install(|| {
            if let Some(previews) = previews {
                preload(previews, ArtifactKind::Preview);
            }
            preload(thumbs, ArtifactKind::Thumbnail);
        });
    }

    /// Queue [`DerivedImageCache::preload_window`] on the worker pool and return.
    ///
    /// Only the photos inside the window are cloned into the task. A preload
    /// for a window the user already left still runs to completion.
    pub fn spawn_preload(
        self: &Arc<Self>,
        photos: &[Photo],
        project: &Path,
        center: usize,
        window: usize,
    ) {
        let radius = window.max(self.settings.preview_radius);
        let Some(range) = clamped_range(photos.len(), center, radius) else {
            return;
        };

        let start = *range.start();
        let owned: Vec<Photo> = photos[range].to_vec();
        let local_center = center.min(photos.len() - 1) - start;
        let project = project.to_path_buf();
        let cache = Arc::clone(self);

        if let Ok(mut count) = self.in_flight.0.lock() {
            *count += 1;
        }
        self.pool.spawn(move || {
            let _guard = InFlightGuard(&cache.in_flight);
            cache.preload_window(&owned, &project, local_center, window);
        });
    }

    /// Block until every spawned preload has finished.
    ///
    /// Call before removing a project's artifacts so a late preload cannot
    /// write into a directory that was just cleaned.
    pub fn wait_for_preloads(&self) {
        let (count, done) = &self.in_flight;
        let Ok(mut pending) = count.lock() else {
            return;
        };
        while *pending > 0 {
            pending = match done.wait(pending) {
                Ok(guard) => guard,
                Err(_) => return,
            };
        }
    }

    /// Remove a project's whole artifact directory
    pub fn cleanup_project(&self, project: &Path) -> bool {
        let dir = self.project_dir(project);
        if !dir.exists() {
            return true;
        }

        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                tracing::debug!("Removed cache directory {}", dir.display());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to remove cache directory {}: {}", dir.display(), e);
                false
            }
        }
    }

    /// Remove both renditions of each photo at its current address.
    ///
    /// Photos whose source file is already gone are skipped; use
    /// [`DerivedImageCache::remove_artifacts`] with recorded addresses then.
    pub fn cleanup_photos(&self, photos: &[Photo], project: &Path) -> usize {
        let addresses: Vec<ContentAddress> = photos
            .iter()
            .filter_map(|photo| ContentAddress::for_photo(photo).ok())
            .collect();
        self.remove_artifacts(project, &addresses)
    }

    /// Remove both renditions of each address. Returns the number of files removed.
    pub fn remove_artifacts(&self, project: &Path, addresses: &[ContentAddress]) -> usize {
        let mut removed = 0;
        for address in addresses {
            for kind in ArtifactKind::ALL {
                let path = self.artifact_path(project, kind, address);
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
                }
            }
        }
        removed
    }

    /// Every artifact file in every project directory
    pub fn artifact_files(&self) -> Vec<(PathBuf, ContentAddress)> {
        let root = self.paths.thumbnails_dir();
        if !root.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?;
                let (_, address) = ArtifactKind::parse_file_name(name)?;
                Some((entry.path().to_path_buf(), address))
            })
            .collect()
    }

    /// Remove project directories that hold no files. Returns how many went.
    pub fn remove_empty_project_dirs(&self) -> usize {
        let Ok(entries) = fs::read_dir(self.paths.thumbnails_dir()) else {
            return 0;
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|dir| dir.is_dir())
            .filter(|dir| fs::read_dir(dir).is_ok_and(|mut children| children.next().is_none()))
            .filter(|dir| match fs::remove_dir(dir) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to remove empty directory {}: {}", dir.display(), e);
                    false
                }
            })
            .count()
    }

    /// Disk usage of the whole cache
    pub fn stats(&self) -> CacheStats {
        let root = self.paths.thumbnails_dir();
        if !root.is_dir() {
            return CacheStats::default();
        }

        let mut stats = CacheStats::default();
        for entry in WalkDir::new(&root).min_depth(1).max_depth(2).into_iter().flatten() {
            if entry.depth() == 1 && entry.file_type().is_dir() {
                stats.projects += 1;
            } else if entry.depth() == 2 && entry.file_type().is_file() {
                stats.artifacts += 1;
                stats.total_size_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        stats
    }
}

/// Indices `center ± radius` clamped to `0..len`, `None` for an empty list
fn clamped_range(len: usize, center: usize, radius: usize) -> Option<RangeInclusive<usize>> {
    if len == 0 {
        return None;
    }
    let center = center.min(len - 1);
    let start = center.saturating_sub(radius);
    let end = center.saturating_add(radius).min(len - 1);
    Some(start..=end)
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8, target: &Path) -> Result<Vec<u8>, CacheError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
        .encode_image(image)
        .map_err(|e| CacheError::EncodeFailed {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(bytes)
}

/// Write through a temp file in the same directory, then rename into place
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let io_error = |source: std::io::Error| CacheError::Io {
        path: target.to_path_buf(),
        source,
    };

    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(io_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(bytes).map_err(io_error)?;
    file.persist(target).map_err(|e| io_error(e.error))?;
    Ok(())
}
