//! Library state machine.

use crate::core::scanner::{Photo, PhotoStatus};
use crate::events::LibraryPhase;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An open folder
#[derive(Debug, Clone)]
pub struct Session {
    pub folder: PathBuf,
    pub photos: Vec<Photo>,
    pub selected: usize,
    /// Files in the folder that are not photos
    pub skipped: Vec<String>,
}

impl Session {
    pub fn current(&self) -> Option<&Photo> {
        self.photos.get(self.selected)
    }

    pub fn counts(&self) -> SelectionCounts {
        let mut counts = SelectionCounts::default();
        for photo in &self.photos {
            match photo.status {
                PhotoStatus::Keep => counts.kept += 1,
                PhotoStatus::Discard => counts.discarded += 1,
                PhotoStatus::Undecided => counts.undecided += 1,
            }
        }
        counts
    }
}

/// `Empty → Scanning → Ready → {Exporting | Deleting} → Empty`
#[derive(Debug, Clone, Default)]
pub enum LibraryState {
    #[default]
    Empty,
    Scanning { folder: PathBuf },
    Ready(Session),
    Exporting(Session),
    Deleting(Session),
}

impl LibraryState {
    pub fn phase(&self) -> LibraryPhase {
        match self {
            Self::Empty => LibraryPhase::Empty,
            Self::Scanning { .. } => LibraryPhase::Scanning,
            Self::Ready(_) => LibraryPhase::Ready,
            Self::Exporting(_) => LibraryPhase::Exporting,
            Self::Deleting(_) => LibraryPhase::Deleting,
        }
    }

    /// The open session in any phase that has one
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Ready(session) | Self::Exporting(session) | Self::Deleting(session) => {
                Some(session)
            }
            Self::Empty | Self::Scanning { .. } => None,
        }
    }
}

/// Decision tally of the open folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCounts {
    pub kept: usize,
    pub discarded: usize,
    pub undecided: usize,
}
