//! # Selection Module
//!
//! Persists keep/discard decisions per source folder.
//!
//! ## File-change detection
//! Each decision is stored with the modification time and size of the
//! photo's primary file. When a folder is re-opened a decision is only
//! restored if the file is unchanged, so re-exported or edited photos come
//! back as undecided.
//!
//! ## Artifact ownership
//! A document also lists the content addresses of the artifacts its project
//! owns. Artifacts listed by no document are orphans and get swept.

mod store;
mod types;

pub use store::SelectionStore;
pub use types::{
    CachedProjectSummary, FolderSelections, RepairReport, SelectionRecord, CACHE_VERSION,
};
