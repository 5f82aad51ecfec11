//! # FotoFilter
//!
//! Photo culling for folders of RAW/JPEG pairs: mark each photo keep or
//! discard, pick up where you left off next session, export the keepers.
//!
//! ## Core Philosophy
//! - **Never lose a decision** - selections persist across sessions
//! - **Never trust a stale decision** - an edited file comes back undecided
//! - **Never block the user** - missing images show placeholders, failed
//!   imports still open the folder
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - Cache, selection store, project registry and session state machine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{FotoFilterError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// Honors `RUST_LOG`, defaulting to `info`. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
