//! Background writer for selection documents.
//!
//! Decisions are saved fire-and-forget from the UI thread. A single writer
//! thread drains the queue in order, so an older snapshot can never
//! overwrite a newer one.

use crate::core::scanner::Photo;
use crate::core::selection::SelectionStore;
use crate::error::FotoFilterError;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

enum WriteCommand {
    Save { folder: PathBuf, photos: Vec<Photo> },
    Flush(Sender<()>),
}

/// Ordered, single-threaded queue of selection saves
pub struct SelectionWriter {
    tx: Option<Sender<WriteCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl SelectionWriter {
    /// Start the writer thread
    pub fn spawn(store: Arc<SelectionStore>) -> Result<Self, FotoFilterError> {
        let (tx, rx) = unbounded();
        let handle = std::thread::Builder::new()
            .name("fotofilter-selections".to_string())
            .spawn(move || run(store, rx))
            .map_err(|e| FotoFilterError::Config(format!("Failed to start writer: {}", e)))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue a snapshot of a folder's photos
    pub fn save(&self, folder: PathBuf, photos: Vec<Photo>) {
        if let Some(tx) = &self.tx {
            if tx.send(WriteCommand::Save { folder, photos }).is_err() {
                tracing::warn!("Selection writer is gone; decision not saved");
            }
        }
    }

    /// Block until every queued save has been written
    pub fn flush(&self) {
        let Some(tx) = &self.tx else {
            return;
        };
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if tx.send(WriteCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }
}

impl Drop for SelectionWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread finish the queue and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(store: Arc<SelectionStore>, rx: Receiver<WriteCommand>) {
    let mut pending: Option<WriteCommand> = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => match rx.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            WriteCommand::Save { folder, mut photos } => {
                // A later snapshot of the same folder supersedes this one
                while let Ok(next) = rx.try_recv() {
                    match next {
                        WriteCommand::Save {
                            folder: next_folder,
                            photos: next_photos,
                        } if next_folder == folder => photos = next_photos,
                        other => {
                            pending = Some(other);
                            break;
                        }
                    }
                }
                store.save_selections(&folder, &photos);
            }
            WriteCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    tracing::debug!("Selection writer stopped");
}
