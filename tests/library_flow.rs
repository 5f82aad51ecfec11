//! Integration tests for a full culling session.
//!
//! These tests drive the library the way the UI does:
//! - Opening a folder fills the cache and restores decisions
//! - Edited files come back undecided
//! - Export and delete reset the library and forget the project
//! - The project list evicts vanished folders

use fotofilter::core::cache::ArtifactKind;
use fotofilter::core::imaging::ImageDecoder;
use fotofilter::core::library::{DeleteMode, Library, LibraryState};
use fotofilter::core::scanner::PhotoStatus;
use fotofilter::core::settings::Settings;
use fotofilter::core::ContentAddress;
use fotofilter::error::{DecodeError, FotoFilterError};
use fotofilter::events::{Event, EventChannel, LibraryEvent, LibraryPhase};
use image::{DynamicImage, ImageBuffer, Rgb};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Decoder returning a solid image for anything not starting with "corrupt"
#[derive(Default)]
struct CountingDecoder {
    calls: AtomicUsize,
}

impl CountingDecoder {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageDecoder for CountingDecoder {
    fn decode_with_orientation(&self, path: &Path) -> Result<DynamicImage, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = fs::read(path).map_err(|e| DecodeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if bytes.starts_with(b"corrupt") {
            return Err(DecodeError::DecodeFailure {
                path: path.to_path_buf(),
                reason: "bad data".to_string(),
            });
        }
        Ok(DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            640,
            480,
            Rgb([90, 120, 160]),
        )))
    }
}

struct Session {
    data: TempDir,
    shoot: TempDir,
    decoder: Arc<CountingDecoder>,
}

impl Session {
    fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            shoot: TempDir::new().unwrap(),
            decoder: Arc::new(CountingDecoder::default()),
        }
    }

    fn write(&self, name: &str, content: &[u8]) {
        fs::write(self.shoot.path().join(name), content).unwrap();
    }

    fn library(&self) -> Library {
        let settings = Settings {
            workers: 2,
            completion_delay_ms: 0,
            preload_window: 2,
            preview_radius: 1,
            ..Default::default()
        };
        Library::builder()
            .root(self.data.path())
            .settings(settings)
            .decoder(self.decoder.clone())
            .delete_mode(DeleteMode::Permanent)
            .build()
            .unwrap()
    }

    fn open(&self, library: &mut Library) {
        library.open_folder(self.shoot.path(), |_, _| {}).unwrap();
    }
}

fn index_of(library: &Library, name: &str) -> usize {
    library
        .photos()
        .iter()
        .position(|p| p.name == name)
        .unwrap()
}

#[test]
fn opening_a_folder_pairs_photos_and_fills_the_cache() {
    let s = Session::new();
    s.write("IMG_0001.CR3", b"raw-1");
    s.write("IMG_0001.JPG", b"jpeg-1");
    s.write("IMG_0002.jpg", b"jpeg-2");
    s.write("notes.txt", b"shot list");

    let mut library = s.library();
    let mut progress = Vec::new();
    let summary = library
        .open_folder(s.shoot.path(), |done, total| progress.push((done, total)))
        .unwrap();

    assert_eq!(library.phase(), LibraryPhase::Ready);
    assert_eq!(library.photos().len(), 2);
    assert_eq!(library.session().unwrap().skipped, vec!["notes.txt".to_string()]);
    assert_eq!(progress, vec![(1, 2), (2, 2)]);
    assert_eq!(summary.generated, 2);
    assert_eq!(summary.failed(), 0);

    let pair = &library.photos()[0];
    assert!(pair.raw_path().is_some());
    assert!(pair.processed_path().is_some());
    assert_eq!(pair.status, PhotoStatus::Undecided);

    library.close_folder();
    assert_eq!(library.cache().stats().artifacts, 4);
}

#[test]
fn raw_only_photo_renders_from_the_raw_file() {
    let s = Session::new();
    s.write("photo1.cr3", b"raw-1");
    s.write("photo1.jpg", b"jpeg-1");
    s.write("photo2.nef", b"raw-2");
    s.write("notes.txt", b"");

    let mut library = s.library();
    let summary = library.open_folder(s.shoot.path(), |_, _| {}).unwrap();

    assert_eq!(library.photos().len(), 2);
    assert_eq!(library.session().unwrap().skipped.len(), 1);
    assert_eq!(summary.generated, 2);

    let raw_only = &library.photos()[1];
    assert_eq!(raw_only.name, "photo2");
    assert!(raw_only.processed_path().is_none());
    assert_eq!(raw_only.source_path(), raw_only.raw_path().unwrap());
}

#[test]
fn reopening_imports_nothing_new() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    s.write("b.jpg", b"b");

    let mut library = s.library();
    s.open(&mut library);
    library.close_folder();
    let decodes = s.decoder.calls();

    let summary = library.open_folder(s.shoot.path(), |_, _| {}).unwrap();
    assert_eq!(summary.already_cached, 2);
    assert_eq!(summary.generated, 0);
    library.close_folder();
    assert_eq!(s.decoder.calls(), decodes);
}

#[test]
fn undecodable_photo_still_opens_with_placeholder() {
    let s = Session::new();
    s.write("good.jpg", b"pixels");
    s.write("bad.jpg", b"corrupt data");

    let mut library = s.library();
    let summary = library.open_folder(s.shoot.path(), |_, _| {}).unwrap();

    assert_eq!(summary.failed(), 1);
    assert_eq!(library.photos().len(), 2);
    let bad = index_of(&library, "bad");
    assert!(library.thumbnail(bad).is_none());
    let good = index_of(&library, "good");
    assert!(library.thumbnail(good).is_some());
}

#[test]
fn missing_folder_leaves_library_empty() {
    let s = Session::new();
    let mut library = s.library();

    let result = library.open_folder(&s.shoot.path().join("nope"), |_, _| {});

    assert!(matches!(result, Err(FotoFilterError::Scan(_))));
    assert_eq!(library.phase(), LibraryPhase::Empty);
}

#[test]
fn decisions_survive_a_new_session() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    s.write("b.jpg", b"b");
    s.write("c.jpg", b"c");

    {
        let mut library = s.library();
        s.open(&mut library);
        library.decide(PhotoStatus::Keep).unwrap();
        library.decide(PhotoStatus::Discard).unwrap();
        assert_eq!(library.selected_index(), Some(2));
        library.close_folder();
    }

    let mut library = s.library();
    s.open(&mut library);
    let statuses: Vec<PhotoStatus> = library.photos().iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![PhotoStatus::Keep, PhotoStatus::Discard, PhotoStatus::Undecided]
    );
    let counts = library.counts();
    assert_eq!((counts.kept, counts.discarded, counts.undecided), (1, 1, 1));
}

#[test]
fn edited_photo_comes_back_undecided() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    s.write("b.jpg", b"b");

    let mut library = s.library();
    s.open(&mut library);
    library.decide(PhotoStatus::Keep).unwrap();
    library.decide(PhotoStatus::Keep).unwrap();
    library.close_folder();

    // Different size, so the stamp changes regardless of mtime resolution
    s.write("b.jpg", b"b, retouched");

    s.open(&mut library);
    assert_eq!(library.photos()[0].status, PhotoStatus::Keep);
    assert_eq!(library.photos()[1].status, PhotoStatus::Undecided);
}

#[test]
fn last_decision_stays_on_last_photo() {
    let s = Session::new();
    s.write("only.jpg", b"x");

    let mut library = s.library();
    s.open(&mut library);
    library.decide(PhotoStatus::Discard).unwrap();

    assert_eq!(library.selected_index(), Some(0));
    assert_eq!(library.current().unwrap().status, PhotoStatus::Discard);
}

#[test]
fn navigation_ignores_out_of_range() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    s.write("b.jpg", b"b");

    let mut library = s.library();
    assert!(!library.navigate(0));

    s.open(&mut library);
    assert!(!library.previous());
    assert!(library.next());
    assert!(!library.next());
    assert!(!library.navigate(5));
    assert_eq!(library.selected_index(), Some(1));
}

#[test]
fn deciding_without_a_folder_is_rejected() {
    let s = Session::new();
    let mut library = s.library();

    let result = library.decide(PhotoStatus::Keep);

    assert!(matches!(result, Err(FotoFilterError::InvalidState { .. })));
    assert!(matches!(library.state(), LibraryState::Empty));
}

#[test]
fn export_copies_kept_files_and_forgets_the_project() {
    let s = Session::new();
    s.write("IMG_1.NEF", b"raw-1");
    s.write("IMG_1.jpg", b"jpeg-1");
    s.write("IMG_2.jpg", b"jpeg-2");
    let dest = TempDir::new().unwrap();

    let mut library = s.library();
    s.open(&mut library);
    library.decide(PhotoStatus::Keep).unwrap();
    library.decide(PhotoStatus::Discard).unwrap();
    let project_dir = library.cache().project_dir(s.shoot.path());

    let mut last = None;
    let report = library
        .export(&dest.path().join("selects"), |done, total| last = Some((done, total)))
        .unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(last, Some((2, 2)));
    assert!(dest.path().join("selects/IMG_1.NEF").is_file());
    assert!(dest.path().join("selects/IMG_1.jpg").is_file());
    assert!(!dest.path().join("selects/IMG_2.jpg").exists());
    // Sources are untouched
    assert!(s.shoot.path().join("IMG_2.jpg").is_file());

    assert_eq!(library.phase(), LibraryPhase::Empty);
    assert!(library.projects().is_empty());
    assert!(!project_dir.exists());
}

#[test]
fn failed_export_returns_to_ready() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    let blocker = TempDir::new().unwrap();
    let not_a_dir = blocker.path().join("file");
    fs::write(&not_a_dir, b"x").unwrap();

    let mut library = s.library();
    s.open(&mut library);
    library.decide(PhotoStatus::Keep).unwrap();

    let result = library.export(&not_a_dir, |_, _| {});

    assert!(matches!(result, Err(FotoFilterError::Transfer(_))));
    assert_eq!(library.phase(), LibraryPhase::Ready);
    assert_eq!(library.photos()[0].status, PhotoStatus::Keep);
}

#[test]
fn delete_removes_discarded_files_and_their_artifacts() {
    let s = Session::new();
    s.write("IMG_1.CR2", b"raw-1");
    s.write("IMG_1.JPG", b"jpeg-1");
    s.write("IMG_2.jpg", b"jpeg-2");

    let mut library = s.library();
    s.open(&mut library);
    let discarded = ContentAddress::for_photo(&library.photos()[0]).unwrap();
    library.decide(PhotoStatus::Discard).unwrap();

    let report = library.delete_discarded().unwrap();

    assert_eq!(report.files, 2);
    assert!(!s.shoot.path().join("IMG_1.CR2").exists());
    assert!(!s.shoot.path().join("IMG_1.JPG").exists());
    assert!(s.shoot.path().join("IMG_2.jpg").is_file());
    assert_eq!(library.phase(), LibraryPhase::Empty);

    let thumb = library
        .cache()
        .artifact_path(s.shoot.path(), ArtifactKind::Thumbnail, &discarded);
    assert!(!thumb.exists());
    assert!(!library.store().document_path(s.shoot.path()).exists());
}

#[test]
fn open_project_cannot_be_forgotten() {
    let s = Session::new();
    s.write("a.jpg", b"a");

    let mut library = s.library();
    s.open(&mut library);
    assert!(library.delete_project(s.shoot.path()).is_err());

    library.close_folder();
    assert_eq!(library.refresh_projects().len(), 1);
    assert!(library.delete_project(s.shoot.path()).unwrap());
    assert!(library.projects().is_empty());
    assert!(!library.cache().project_dir(s.shoot.path()).exists());
}

#[test]
fn project_list_reflects_decisions_and_evicts_vanished_folders() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    s.write("b.jpg", b"b");

    let mut library = s.library();
    s.open(&mut library);
    library.decide(PhotoStatus::Keep).unwrap();
    library.close_folder();

    let projects = library.refresh_projects().to_vec();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].total_photos, 2);
    assert_eq!(projects[0].kept, 1);
    assert_eq!(projects[0].remaining, 1);

    fs::remove_dir_all(s.shoot.path()).unwrap();
    assert!(library.refresh_projects().is_empty());
    assert!(!library.cache().project_dir(s.shoot.path()).exists());
    assert!(!library.store().document_path(s.shoot.path()).exists());
}

#[test]
fn repair_is_idempotent() {
    let s = Session::new();
    s.write("a.jpg", b"a");

    let mut library = s.library();
    s.open(&mut library);
    library.close_folder();

    library.registry().repair();
    let second = library.registry().repair();

    assert_eq!(second.documents_checked, 1);
    assert_eq!(second.documents_rewritten, 0);
    assert_eq!(second.orphans_removed, 0);
}

#[test]
fn state_changes_are_published() {
    let s = Session::new();
    s.write("a.jpg", b"a");
    let (sender, receiver) = EventChannel::new();

    let mut library = Library::builder()
        .root(s.data.path())
        .settings(Settings {
            workers: 1,
            completion_delay_ms: 0,
            ..Default::default()
        })
        .decoder(s.decoder.clone())
        .events(sender)
        .build()
        .unwrap();
    s.open(&mut library);
    library.close_folder();

    let phases: Vec<LibraryPhase> = receiver
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            Event::Library(LibraryEvent::StateChanged { phase }) => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![LibraryPhase::Scanning, LibraryPhase::Ready, LibraryPhase::Empty]
    );
}
