//! # Handoff Module
//!
//! Bounded producer/consumer queue with an explicit end-of-stream marker.
//!
//! Used when a slow consumer (a rendering surface, a terminal) must not be
//! driven directly by the pipeline. `put` blocks once `capacity` records are
//! waiting, so a stalled consumer throttles the producer instead of letting
//! memory grow.
//!
//! ## Lifecycle
//! `Open` -> `Closing` (close marker enqueued) -> `Closed` (consumer reached
//! the marker). `close` succeeds once; later calls return
//! [`QueueError::Closed`] and enqueue nothing. Dropping the producer closes
//! the queue if nobody did.
//!
//! ## Example
//! ```rust,ignore
//! let (mut producer, consumer) = HandoffQueue::bounded(16)?;
//! std::thread::spawn(move || {
//!     for record in stream {
//!         if producer.put(record).is_err() {
//!             break;
//!         }
//!     }
//!     let _ = producer.close();
//! });
//! for record in consumer {
//!     render(record);
//! }
//! ```

use crate::error::{ConfigError, QueueError};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Where a queue is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Accepting records
    Open,
    /// Close marker enqueued, consumer still draining
    Closing,
    /// Consumer has reached the close marker (or is gone)
    Closed,
}

impl QueueState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            OPEN => QueueState::Open,
            CLOSING => QueueState::Closing,
            _ => QueueState::Closed,
        }
    }
}

/// Either a real record or the reserved close marker
enum Slot<T> {
    Item(T),
    Close,
}

/// Constructor for producer/consumer pairs
pub struct HandoffQueue;

impl HandoffQueue {
    /// Create a queue holding at most `capacity` unconsumed records.
    pub fn bounded<T>(capacity: usize) -> Result<(HandoffProducer<T>, HandoffConsumer<T>), ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }

        let (tx, rx) = bounded(capacity);
        let state = Arc::new(AtomicU8::new(OPEN));

        Ok((
            HandoffProducer {
                tx,
                state: Arc::clone(&state),
                capacity,
            },
            HandoffConsumer {
                rx,
                state,
                finished: false,
            },
        ))
    }
}

/// The single writing end of a handoff queue.
///
/// Not cloneable: exactly one producer puts records and closes.
pub struct HandoffProducer<T> {
    tx: Sender<Slot<T>>,
    state: Arc<AtomicU8>,
    capacity: usize,
}

impl<T> HandoffProducer<T> {
    /// Enqueue a record, blocking while the queue is full.
    pub fn put(&mut self, item: T) -> Result<(), QueueError> {
        self.ensure_open()?;
        self.tx
            .send(Slot::Item(item))
            .map_err(|_| self.consumer_gone())
    }

    /// Enqueue a record only if there is room right now.
    pub fn try_put(&mut self, item: T) -> Result<(), QueueError> {
        self.ensure_open()?;
        match self.tx.try_send(Slot::Item(item)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(QueueError::Full),
            Err(TrySendError::Disconnected(_)) => Err(self.consumer_gone()),
        }
    }

    /// Enqueue the close marker after the last record.
    ///
    /// Blocks while the queue is full. A second call is rejected with
    /// [`QueueError::Closed`] and leaves the queue untouched.
    pub fn close(&mut self) -> Result<(), QueueError> {
        self.state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| QueueError::Closed)?;

        if self.tx.send(Slot::Close).is_err() {
            self.state.store(CLOSED, Ordering::Release);
        }
        Ok(())
    }

    pub fn state(&self) -> QueueState {
        QueueState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn is_closed(&self) -> bool {
        self.state() != QueueState::Open
    }

    /// Slots currently occupied (records plus a pending close marker)
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn ensure_open(&self) -> Result<(), QueueError> {
        if self.is_closed() {
            Err(QueueError::Closed)
        } else {
            Ok(())
        }
    }

    fn consumer_gone(&self) -> QueueError {
        self.state.store(CLOSED, Ordering::Release);
        QueueError::Disconnected
    }
}

impl<T> Drop for HandoffProducer<T> {
    fn drop(&mut self) {
        if self
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        // Never block here. On a full queue the marker is skipped and the
        // disconnect that follows ends the consumer's stream instead.
        match self.tx.try_send(Slot::Close) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => self.state.store(CLOSED, Ordering::Release),
        }
    }
}

/// The reading end of a handoff queue.
///
/// Iterating yields records until the close marker, then stops for good.
pub struct HandoffConsumer<T> {
    rx: Receiver<Slot<T>>,
    state: Arc<AtomicU8>,
    finished: bool,
}

impl<T> HandoffConsumer<T> {
    /// Next record, blocking while the queue is empty and open.
    ///
    /// Returns `None` once the close marker is reached; every later call
    /// returns `None` without blocking.
    pub fn get(&mut self) -> Option<T> {
        if self.finished {
            return None;
        }

        match self.rx.recv() {
            Ok(Slot::Item(item)) => Some(item),
            Ok(Slot::Close) | Err(_) => {
                self.finished = true;
                self.state.store(CLOSED, Ordering::Release);
                None
            }
        }
    }

    pub fn state(&self) -> QueueState {
        QueueState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Whether this consumer has reached the end of the stream
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Records (and a pending close marker) waiting to be read
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Iterator for HandoffConsumer<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.get()
    }
}
