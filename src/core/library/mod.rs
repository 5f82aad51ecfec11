//! # Library Module
//!
//! Orchestrates a culling session on top of the cache, the selection store
//! and the project registry.
//!
//! ## Example
//! ```rust,ignore
//! use fotofilter::core::library::Library;
//! use fotofilter::core::scanner::PhotoStatus;
//!
//! let mut library = Library::builder().build()?;
//! library.open_folder("/Users/ana/Shoots/2024-06-01".as_ref(), |done, total| {
//!     println!("{done}/{total}");
//! })?;
//! library.decide(PhotoStatus::Keep)?;
//! library.export("/Users/ana/Selects".as_ref(), |_, _| {})?;
//! ```

mod orchestrator;
mod state;
mod transfer;
mod writer;

pub use orchestrator::{Library, LibraryBuilder};
pub use state::{LibraryState, SelectionCounts, Session};
pub use transfer::{BestEffortTransfer, DeleteMode, FileTransfer, TransferReport};
pub use writer::SelectionWriter;
