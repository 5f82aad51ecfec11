//! Event type definitions for progress and state notifications.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the culling library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Folder scanning events
    Scan(ScanEvent),
    /// Cache-fill events during folder import
    Import(ImportEvent),
    /// Library state machine events
    Library(LibraryEvent),
    /// Project registry events
    Registry(RegistryEvent),
}

/// Events during the folder scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { path: PathBuf },
    /// A file was ignored because it is not a photo
    Skipped { file_name: String },
    /// Scanning completed
    Completed { photos: usize, skipped: usize },
    /// The folder could not be scanned
    Failed { path: PathBuf, message: String },
}

/// Events while filling the thumbnail/preview cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// Cache fill has started
    Started { total_photos: usize },
    /// One more photo finished (successfully or not)
    Progress(ImportProgress),
    /// A photo could not be rendered; it will show a placeholder
    ArtifactFailed { path: PathBuf, message: String },
    /// Cache fill completed
    Completed {
        generated: usize,
        already_cached: usize,
        failed: usize,
    },
}

/// Progress information during a cache fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportProgress {
    /// Photos finished so far
    pub completed: usize,
    /// Photos in the folder
    pub total: usize,
}

/// Events from the library state machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LibraryEvent {
    /// The library moved to a new phase
    StateChanged { phase: LibraryPhase },
    /// The selected photo changed
    SelectionChanged { index: usize },
    /// A decision was recorded for a photo
    Decided { path: PathBuf, status: String },
    /// Export or delete finished
    OperationCompleted { phase: LibraryPhase, files: usize },
    /// Export or delete failed; the library is back to ready
    OperationFailed { phase: LibraryPhase, message: String },
}

/// Events from the project registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegistryEvent {
    /// The project list was recomputed
    Refreshed { projects: usize },
    /// A cached project was removed
    ProjectRemoved { folder: PathBuf },
    /// Repair ran and changed something on disk
    Repaired {
        documents_rewritten: usize,
        orphans_removed: usize,
    },
}

/// Phases of the library state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryPhase {
    Empty,
    Scanning,
    Ready,
    Exporting,
    Deleting,
}

impl std::fmt::Display for LibraryPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryPhase::Empty => write!(f, "empty"),
            LibraryPhase::Scanning => write!(f, "scanning"),
            LibraryPhase::Ready => write!(f, "ready"),
            LibraryPhase::Exporting => write!(f, "exporting"),
            LibraryPhase::Deleting => write!(f, "deleting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Import(ImportEvent::Progress(ImportProgress {
            completed: 3,
            total: 10,
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Import(ImportEvent::Progress(p)) => {
                assert_eq!(p.completed, 3);
                assert_eq!(p.total, 10);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(LibraryPhase::Exporting.to_string(), "exporting");
        assert_eq!(LibraryPhase::Ready.to_string(), "ready");
    }
}
