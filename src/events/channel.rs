//! Event channel implementation using crossbeam-channel.
//!
//! Progress events are advisory: a sender never blocks the pipeline on a
//! slow listener, it drops the event instead.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use std::fmt;

use super::Event;

/// Sends events from the core library.
///
/// Cloneable and `Send`; a disabled sender swallows everything.
#[derive(Clone, Default)]
pub struct EventSender {
    inner: Option<Sender<Event>>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender.
    pub fn new(sender: Sender<Event>) -> Self {
        Self {
            inner: Some(sender),
        }
    }

    /// A sender that discards every event.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Send an event without blocking.
    ///
    /// Full or disconnected channels drop the event.
    pub fn send(&self, event: Event) {
        let Some(inner) = &self.inner else {
            return;
        };
        match inner.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(_)) => {
                tracing::trace!("event channel full, dropping progress event");
            }
        }
    }

    /// Whether events sent here can reach a listener
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Receives events from the core library.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event; `None` once every sender is gone.
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Constructors for sender/receiver pairs.
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }

    /// Create a bounded event channel; events beyond `capacity` are dropped.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (EventSender::new(sender), EventReceiver { inner: receiver })
    }
}

/// A no-op event sender for when you don't need progress reporting.
pub fn null_sender() -> EventSender {
    EventSender::disabled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PipelineEvent, ScanEvent};
    use std::path::PathBuf;
    use std::thread;

    fn started() -> Event {
        Event::Pipeline(PipelineEvent::Started {
            workers: 1,
            prefetch: 2,
        })
    }

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Scan(ScanEvent::FileFound {
                path: PathBuf::from("/test/a.png"),
            }));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Scan(ScanEvent::FileFound { path }) => {
                assert!(path.ends_with("a.png"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        assert!(!sender.is_enabled());
        sender.send(started());
    }

    #[test]
    fn bounded_channel_drops_overflow_instead_of_blocking() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.send(started());
        sender.send(started());
        sender.send(started());

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }
}
