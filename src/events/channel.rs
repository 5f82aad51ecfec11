//! Event channel built on crossbeam-channel.
//!
//! The library never blocks on listeners: a dropped receiver simply
//! turns every send into a no-op.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Cloneable handle the library uses to publish events.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Publish an event, discarding it if nobody is listening.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// UI-side end of the channel.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event arrives
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Take the next event if one is queued
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Collect everything queued right now, for UIs that poll once per frame
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    /// Blocking iterator over events until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; events are small.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Bounded channel for a UI that wants backpressure.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// Sender whose receiver is already gone.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
