//! # Events Module
//!
//! Progress and state-change notifications for whatever UI sits on top.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let mut library = Library::builder().events(sender).build()?;
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Import(ImportEvent::Progress(p)) = event {
//!             println!("{}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
