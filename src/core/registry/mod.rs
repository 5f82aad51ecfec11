//! # Registry Module
//!
//! The list of cached projects shown on the start screen.
//!
//! Thin layer over [`SelectionStore`]: every refresh repairs the documents
//! first, so the list never shows a project whose artifacts are not tracked.

use crate::core::selection::{CachedProjectSummary, RepairReport, SelectionStore};
use crate::events::{null_sender, Event, EventSender, RegistryEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One row of the project list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub folder_path: PathBuf,
    pub folder_name: String,
    pub last_accessed: DateTime<Utc>,
    pub total_photos: usize,
    pub kept: usize,
    pub discarded: usize,
    pub remaining: usize,
}

impl ProjectEntry {
    /// Share of photos with a decision, 0.0 to 1.0
    pub fn decided_fraction(&self) -> f64 {
        if self.total_photos == 0 {
            return 0.0;
        }
        let decided = self.total_photos - self.remaining.min(self.total_photos);
        decided as f64 / self.total_photos as f64
    }
}

impl From<CachedProjectSummary> for ProjectEntry {
    fn from(summary: CachedProjectSummary) -> Self {
        Self {
            last_accessed: DateTime::<Utc>::from_timestamp_millis(summary.last_accessed)
                .unwrap_or_default(),
            folder_path: summary.folder_path,
            folder_name: summary.folder_name,
            total_photos: summary.total_photos,
            kept: summary.kept_count,
            discarded: summary.discarded_count,
            remaining: summary.remaining_count,
        }
    }
}

/// Cached projects, most recently opened first
pub struct ProjectRegistry {
    store: Arc<SelectionStore>,
    events: EventSender,
}

impl ProjectRegistry {
    pub fn new(store: Arc<SelectionStore>) -> Self {
        Self {
            store,
            events: null_sender(),
        }
    }

    /// Report through an event channel
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Repair, then list
    pub fn refresh(&self) -> Vec<ProjectEntry> {
        self.repair();
        let projects = self.list();
        self.events.send(Event::Registry(RegistryEvent::Refreshed {
            projects: projects.len(),
        }));
        projects
    }

    /// List without repairing
    pub fn list(&self) -> Vec<ProjectEntry> {
        self.store
            .list_cached_projects()
            .into_iter()
            .map(ProjectEntry::from)
            .collect()
    }

    pub fn repair(&self) -> RepairReport {
        let report = self.store.validate_and_repair_cache();
        if !report.is_clean() {
            tracing::info!(
                "Repair rewrote {} documents and removed {} orphans",
                report.documents_rewritten,
                report.orphans_removed
            );
            self.events.send(Event::Registry(RegistryEvent::Repaired {
                documents_rewritten: report.documents_rewritten,
                orphans_removed: report.orphans_removed,
            }));
        }
        report
    }

    /// Forget a project and its artifacts
    pub fn delete(&self, folder: &Path) -> bool {
        let removed = self.store.delete_cached_project(folder);
        if removed {
            self.events.send(Event::Registry(RegistryEvent::ProjectRemoved {
                folder: folder.to_path_buf(),
            }));
        }
        removed
    }

    /// Session-start housekeeping: drop stale projects
    pub fn cleanup_old(&self, max_age_days: u32) -> usize {
        let removed = self.store.cleanup_old_selections(max_age_days);
        if removed > 0 {
            tracing::info!("Dropped {} projects unopened for {} days", removed, max_age_days);
        }
        removed
    }
}
