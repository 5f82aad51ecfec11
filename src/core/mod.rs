//! # Core Module
//!
//! The GUI-agnostic culling engine.
//!
//! ## Modules
//! - `scanner` - Finds photos in a folder and pairs RAW + processed files
//! - `address` - Content addresses naming cache artifacts
//! - `imaging` - Decodes, orients and downsizes source images
//! - `cache` - Thumbnail/preview cache on disk
//! - `selection` - Persists keep/discard decisions per folder
//! - `registry` - The list of cached projects
//! - `library` - Orchestrates a culling session
//! - `paths`, `settings` - On-disk layout and tunables

pub mod address;
pub mod cache;
pub mod imaging;
pub mod library;
pub mod paths;
pub mod registry;
pub mod scanner;
pub mod selection;
pub mod settings;

// Re-export commonly used types
pub use address::ContentAddress;
pub use library::{Library, LibraryBuilder};
pub use scanner::{Photo, PhotoStatus};
pub use settings::Settings;
