//! Event channel built on crossbeam-channel.
//!
//! Scan workers run on a rayon pool, so the sending half must be cheap to
//! clone and safe to share between worker threads.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Sending half handed to a scan.
///
/// A disabled sender drops every event without allocating a channel.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender
    pub fn new(sender: Sender<Event>) -> Self {
        Self {
            inner: Some(sender),
        }
    }

    /// A sender that reports nothing
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether anything can still receive the events
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Send an event. Blocks only on a full bounded channel.
    ///
    /// Events sent after the receiver is gone are discarded.
    pub fn send(&self, event: Event) {
        if let Some(sender) = &self.inner {
            let _ = sender.send(event);
        }
    }
}

/// Receiving half, read by a front end or a test
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event, `None` once every sender is dropped
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Everything already queued, without blocking
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructors for connected sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel. Scan events are small, so this is the usual choice.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }

    /// Bounded channel: workers wait when a slow front end falls `capacity`
    /// events behind.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }
}

/// Sender for scans nobody watches
pub fn null_sender() -> EventSender {
    EventSender::disabled()
}
