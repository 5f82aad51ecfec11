//! The library the UI binds to.

use super::state::{LibraryState, SelectionCounts, Session};
use super::transfer::{BestEffortTransfer, DeleteMode, FileTransfer, TransferReport};
use super::writer::SelectionWriter;
use crate::core::address::ContentAddress;
use crate::core::cache::{ArtifactKind, CachedArtifact, DerivedImageCache, ImportSummary, RecentImages};
use crate::core::imaging::{ImageDecoder, StandardDecoder};
use crate::core::paths::{absolute_path, AppPaths};
use crate::core::registry::{ProjectEntry, ProjectRegistry};
use crate::core::scanner::{FolderScanner, Photo, PhotoStatus, WalkDirScanner};
use crate::core::selection::SelectionStore;
use crate::core::settings::Settings;
use crate::error::{FotoFilterError, Result};
use crate::events::{
    null_sender, Event, EventSender, ImportEvent, ImportProgress, LibraryEvent, LibraryPhase,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn invalid_state(phase: LibraryPhase, action: &str) -> FotoFilterError {
    FotoFilterError::InvalidState {
        state: phase.to_string(),
        action: action.to_string(),
    }
}

/// Builder for a [`Library`]
pub struct LibraryBuilder {
    paths: Option<AppPaths>,
    settings: Option<Settings>,
    scanner: Option<Box<dyn FolderScanner>>,
    decoder: Option<Arc<dyn ImageDecoder>>,
    transfer: Option<Box<dyn FileTransfer>>,
    events: Option<EventSender>,
    delete_mode: DeleteMode,
}

impl LibraryBuilder {
    /// Create a new library builder
    pub fn new() -> Self {
        Self {
            paths: None,
            settings: None,
            scanner: None,
            decoder: None,
            transfer: None,
            events: None,
            delete_mode: DeleteMode::default(),
        }
    }

    /// Use this data directory instead of `~/.fotofilter`
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.paths = Some(AppPaths::new(root));
        self
    }

    /// Override settings instead of reading `settings.json`
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Set the folder scanner
    pub fn scanner(mut self, scanner: Box<dyn FolderScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Set the image decoder
    pub fn decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Set the file transfer used by export and delete
    pub fn transfer(mut self, transfer: Box<dyn FileTransfer>) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Report through an event channel
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// How discarded photos are deleted
    pub fn delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    /// Build the library and its shared services
    pub fn build(self) -> Result<Library> {
        let paths = match self.paths {
            Some(paths) => paths,
            None => AppPaths::from_home()
                .ok_or_else(|| FotoFilterError::Config("Cannot locate home directory".to_string()))?,
        };
        let settings = self.settings.unwrap_or_else(|| Settings::load(&paths));
        let events = self.events.unwrap_or_else(null_sender);
        let decoder = self.decoder.unwrap_or_else(|| Arc::new(StandardDecoder));

        let cache = Arc::new(DerivedImageCache::new(
            paths.clone(),
            settings.clone(),
            decoder,
        )?);
        let store = Arc::new(SelectionStore::new(paths.clone(), Arc::clone(&cache)));
        let registry = ProjectRegistry::new(Arc::clone(&store)).with_events(events.clone());
        let writer = SelectionWriter::spawn(Arc::clone(&store))?;

        tracing::debug!("Library data directory: {}", paths.root().display());

        Ok(Library {
            state: LibraryState::Empty,
            settings,
            scanner: self
                .scanner
                .unwrap_or_else(|| Box::new(WalkDirScanner::default())),
            cache,
            store,
            registry,
            writer,
            transfer: self.transfer.unwrap_or_else(|| Box::new(BestEffortTransfer)),
            delete_mode: self.delete_mode,
            recent: RecentImages::default(),
            events,
            projects: Vec::new(),
        })
    }
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Culling session state machine.
///
/// `Empty → Scanning → Ready → {Exporting | Deleting} → Empty`. Every
/// transition is published as [`LibraryEvent::StateChanged`].
pub struct Library {
    state: LibraryState,
    settings: Settings,
    scanner: Box<dyn FolderScanner>,
    cache: Arc<DerivedImageCache>,
    store: Arc<SelectionStore>,
    registry: ProjectRegistry,
    writer: SelectionWriter,
    transfer: Box<dyn FileTransfer>,
    delete_mode: DeleteMode,
    recent: RecentImages,
    events: EventSender,
    projects: Vec<ProjectEntry>,
}

impl Library {
    /// Create a new library builder
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    pub fn phase(&self) -> LibraryPhase {
        self.state.phase()
    }

    pub fn state(&self) -> &LibraryState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.state.session()
    }

    /// Photos of the open folder, empty when none is open
    pub fn photos(&self) -> &[Photo] {
        self.session().map(|s| s.photos.as_slice()).unwrap_or(&[])
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.session().map(|s| s.selected)
    }

    pub fn current(&self) -> Option<&Photo> {
        self.session().and_then(Session::current)
    }

    pub fn folder(&self) -> Option<&Path> {
        self.session().map(|s| s.folder.as_path())
    }

    pub fn counts(&self) -> SelectionCounts {
        self.session().map(Session::counts).unwrap_or_default()
    }

    /// Last project list computed by [`Library::refresh_projects`]
    pub fn projects(&self) -> &[ProjectEntry] {
        &self.projects
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &Arc<DerivedImageCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<SelectionStore> {
        &self.store
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    fn set_state(&mut self, state: LibraryState) {
        let phase = state.phase();
        self.state = state;
        tracing::info!("Library is {}", phase);
        self.events
            .send(Event::Library(LibraryEvent::StateChanged { phase }));
    }

    /// Scan a folder, restore its decisions and fill the cache.
    ///
    /// A folder that is already open is closed first. A scan failure leaves
    /// the library empty; import failures only mean placeholders.
    pub fn open_folder<F>(&mut self, folder: &Path, mut on_progress: F) -> Result<ImportSummary>
    where
        F: FnMut(usize, usize),
    {
        match self.phase() {
            LibraryPhase::Empty => {}
            LibraryPhase::Ready => {
                self.close_folder();
            }
            phase => return Err(invalid_state(phase, "open a folder")),
        }

        let folder = absolute_path(folder);
        self.set_state(LibraryState::Scanning {
            folder: folder.clone(),
        });

        let scan = match self.scanner.scan_with_events(&folder, &self.events) {
            Ok(scan) => scan,
            Err(e) => {
                tracing::warn!("Cannot open {}: {}", folder.display(), e);
                self.set_state(LibraryState::Empty);
                return Err(e.into());
            }
        };

        let photos = self.store.load_selections(&folder, scan.photos);
        // Record artifact ownership before the cache fills
        self.store.save_selections(&folder, &photos);

        self.events.send(Event::Import(ImportEvent::Started {
            total_photos: photos.len(),
        }));
        let events = self.events.clone();
        let summary = self.cache.import_folder(&photos, &folder, |completed, total| {
            events.send(Event::Import(ImportEvent::Progress(ImportProgress {
                completed,
                total,
            })));
            on_progress(completed, total);
        });
        for failure in &summary.failures {
            self.events.send(Event::Import(ImportEvent::ArtifactFailed {
                path: failure.path.clone(),
                message: failure.message.clone(),
            }));
        }
        self.events.send(Event::Import(ImportEvent::Completed {
            generated: summary.generated,
            already_cached: summary.already_cached,
            failed: summary.failed(),
        }));

        self.set_state(LibraryState::Ready(Session {
            folder,
            photos,
            selected: 0,
            skipped: scan.skipped,
        }));
        self.selection_changed();
        Ok(summary)
    }

    /// Record a decision for the selected photo and move to the next one
    pub fn decide(&mut self, status: PhotoStatus) -> Result<()> {
        let phase = self.phase();
        let LibraryState::Ready(session) = &mut self.state else {
            return Err(invalid_state(phase, "record a decision"));
        };
        let selected = session.selected;
        let Some(photo) = session.photos.get_mut(selected) else {
            return Ok(());
        };

        photo.status = status;
        let path = photo.primary_path().to_path_buf();
        self.writer
            .save(session.folder.clone(), session.photos.clone());
        let has_next = selected + 1 < session.photos.len();

        tracing::debug!("{} -> {}", path.display(), status.as_str());
        self.events.send(Event::Library(LibraryEvent::Decided {
            path,
            status: status.as_str().to_string(),
        }));

        if has_next {
            self.navigate(selected + 1);
        }
        Ok(())
    }

    /// Select a photo and preload around it. Out-of-range indices are ignored.
    pub fn navigate(&mut self, index: usize) -> bool {
        let LibraryState::Ready(session) = &mut self.state else {
            return false;
        };
        if index >= session.photos.len() {
            return false;
        }
        session.selected = index;
        self.selection_changed();
        true
    }

    pub fn next(&mut self) -> bool {
        match self.selected_index() {
            Some(index) => self.navigate(index + 1),
            None => false,
        }
    }

    pub fn previous(&mut self) -> bool {
        match self.selected_index().and_then(|i| i.checked_sub(1)) {
            Some(index) => self.navigate(index),
            None => false,
        }
    }

    fn selection_changed(&self) {
        let LibraryState::Ready(session) = &self.state else {
            return;
        };
        self.events.send(Event::Library(LibraryEvent::SelectionChanged {
            index: session.selected,
        }));
        self.cache.spawn_preload(
            &session.photos,
            &session.folder,
            session.selected,
            self.settings.preload_window,
        );
    }

    /// Thumbnail of the photo at `index`
    pub fn thumbnail(&self, index: usize) -> Option<Arc<CachedArtifact>> {
        self.artifact(index, ArtifactKind::Thumbnail)
    }

    /// Preview of the photo at `index`
    pub fn preview(&self, index: usize) -> Option<Arc<CachedArtifact>> {
        self.artifact(index, ArtifactKind::Preview)
    }

    fn artifact(&self, index: usize, kind: ArtifactKind) -> Option<Arc<CachedArtifact>> {
        let session = self.session()?;
        let photo = session.photos.get(index)?;

        if let Ok(address) = ContentAddress::for_photo(photo) {
            if let Some(hit) = self.recent.get(kind, &address) {
                return Some(hit);
            }
        }

        let artifact = Arc::new(self.cache.get(photo, &session.folder, kind)?);
        self.recent.insert(Arc::clone(&artifact));
        Some(artifact)
    }

    /// Copy the files of every kept photo into `destination`.
    ///
    /// On success the project is forgotten and the library resets to empty.
    /// On failure the library goes back to ready; files already copied stay.
    pub fn export<F>(&mut self, destination: &Path, mut on_progress: F) -> Result<TransferReport>
    where
        F: FnMut(usize, usize),
    {
        let session = self.begin_operation("export")?;
        let files = backing_files(&session.photos, PhotoStatus::Keep);
        let folder = session.folder.clone();
        self.set_state(LibraryState::Exporting(session));

        match self
            .transfer
            .copy_files(&files, destination, &mut on_progress)
        {
            Ok(report) => {
                self.cache.cleanup_project(&folder);
                self.store.delete_selections(&folder);
                self.finish_operation(LibraryPhase::Exporting, report.files);
                Ok(report)
            }
            Err(e) => {
                self.fail_operation(LibraryPhase::Exporting, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Delete the files of every discarded photo, together with their artifacts.
    ///
    /// Same reset and failure behavior as [`Library::export`].
    pub fn delete_discarded(&mut self) -> Result<TransferReport> {
        let session = self.begin_operation("delete discarded photos")?;
        let files = backing_files(&session.photos, PhotoStatus::Discard);
        // Addresses must be taken while the files still exist
        let addresses: Vec<ContentAddress> = session
            .photos
            .iter()
            .filter(|p| p.status == PhotoStatus::Discard)
            .filter_map(|p| ContentAddress::for_photo(p).ok())
            .collect();
        let folder = session.folder.clone();
        self.set_state(LibraryState::Deleting(session));

        match self.transfer.delete_files(&files, self.delete_mode) {
            Ok(report) => {
                self.cache.remove_artifacts(&folder, &addresses);
                self.store.delete_selections(&folder);
                self.finish_operation(LibraryPhase::Deleting, report.files);
                Ok(report)
            }
            Err(e) => {
                self.fail_operation(LibraryPhase::Deleting, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Take the session out of `Ready`, with every pending save written
    fn begin_operation(&mut self, action: &str) -> Result<Session> {
        let phase = self.phase();
        match std::mem::take(&mut self.state) {
            LibraryState::Ready(session) => {
                self.writer.flush();
                self.cache.wait_for_preloads();
                Ok(session)
            }
            other => {
                self.state = other;
                Err(invalid_state(phase, action))
            }
        }
    }

    fn finish_operation(&mut self, phase: LibraryPhase, files: usize) {
        self.events
            .send(Event::Library(LibraryEvent::OperationCompleted { phase, files }));

        let delay = self.settings.completion_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.recent.clear();
        self.set_state(LibraryState::Empty);
        self.refresh_projects();
    }

    fn fail_operation(&mut self, phase: LibraryPhase, message: &str) {
        tracing::warn!("{} failed: {}", phase, message);
        self.events.send(Event::Library(LibraryEvent::OperationFailed {
            phase,
            message: message.to_string(),
        }));

        let next = match std::mem::take(&mut self.state) {
            LibraryState::Exporting(session)
            | LibraryState::Deleting(session)
            | LibraryState::Ready(session) => LibraryState::Ready(session),
            other => other,
        };
        self.set_state(next);
    }

    /// Save and close the open folder. Returns whether one was open.
    pub fn close_folder(&mut self) -> bool {
        let LibraryState::Ready(session) = std::mem::take(&mut self.state) else {
            return false;
        };

        self.writer.flush();
        self.cache.wait_for_preloads();
        self.store.save_selections(&session.folder, &session.photos);
        self.recent.clear();
        self.set_state(LibraryState::Empty);
        true
    }

    /// Repair the cache and reload the project list
    pub fn refresh_projects(&mut self) -> &[ProjectEntry] {
        self.writer.flush();
        self.projects = self.registry.refresh();
        &self.projects
    }

    /// Forget a cached project. The open folder cannot be forgotten.
    pub fn delete_project(&mut self, folder: &Path) -> Result<bool> {
        let folder = absolute_path(folder);
        if self.folder() == Some(folder.as_path()) {
            return Err(invalid_state(self.phase(), "forget the open folder"));
        }

        self.writer.flush();
        let removed = self.registry.delete(&folder);
        self.refresh_projects();
        Ok(removed)
    }

    /// Session-start housekeeping: drop stale projects, repair, reload the list.
    ///
    /// Returns the number of stale projects removed.
    pub fn run_maintenance(&mut self) -> usize {
        self.writer.flush();
        let removed = self
            .registry
            .cleanup_old(self.settings.selection_max_age_days);
        self.refresh_projects();
        removed
    }

    /// Block until queued selection saves are on disk
    pub fn flush_pending_saves(&self) {
        self.writer.flush();
    }
}

fn backing_files(photos: &[Photo], status: PhotoStatus) -> Vec<PathBuf> {
    photos
        .iter()
        .filter(|p| p.status == status)
        .flat_map(|p| p.backing_files())
        .map(Path::to_path_buf)
        .collect()
}
