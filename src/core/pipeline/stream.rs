//! Result stream: merges worker outcomes with dedup decisions.

use super::pool::OutcomeStream;
use crate::core::dedup::DedupIndex;
use crate::core::handoff::{HandoffConsumer, HandoffQueue};
use crate::core::hasher::{Fingerprint, HashOutcome, Payload};
use crate::error::ConfigError;
use crate::events::{Event, EventSender, HashEvent, PipelineEvent, PipelineSummary};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Verdict for one crawled file
#[derive(Debug, Clone)]
pub struct ResultRecord {
    /// `false` for first-seen files and for files that could not be read
    pub is_duplicate: bool,
    /// Path as produced by the crawler
    pub path: PathBuf,
    /// File bytes for rendering; empty when unavailable
    pub payload: Payload,
    /// Content fingerprint, absent for failed files
    pub fingerprint: Option<Fingerprint>,
    /// For duplicates, the file that first claimed this fingerprint
    pub first_seen: Option<PathBuf>,
    /// Why the file could not be read
    pub error: Option<String>,
}

impl ResultRecord {
    /// Whether fingerprinting failed for this file
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Lazy sequence of [`ResultRecord`], one per crawled candidate, in
/// completion order.
///
/// Owns the run's [`DedupIndex`]; this is the only place it is touched, so
/// uniqueness decisions are serialized. Not restartable: build a new stream
/// (fresh crawl, empty index) to run again. Dropping an unfinished stream
/// cancels its run.
pub struct ResultStream {
    outcomes: OutcomeStream,
    index: DedupIndex,
    events: EventSender,
    summary: PipelineSummary,
    started: Instant,
    finished: bool,
}

impl ResultStream {
    pub(crate) fn new(outcomes: OutcomeStream, events: EventSender) -> Self {
        Self {
            outcomes,
            index: DedupIndex::new(),
            events,
            summary: PipelineSummary::default(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Stop dispatching new files. Records already in flight still arrive,
    /// then the stream ends.
    pub fn cancel(&self) {
        self.outcomes.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcomes.is_cancelled()
    }

    /// Counts so far; final once the stream has returned `None`
    pub fn summary(&self) -> PipelineSummary {
        if self.finished {
            return self.summary.clone();
        }
        PipelineSummary {
            duration_ms: self.started.elapsed().as_millis() as u64,
            cancelled: self.is_cancelled(),
            ..self.summary.clone()
        }
    }

    /// Read-only view of the fingerprints recorded so far
    pub fn index(&self) -> &DedupIndex {
        &self.index
    }

    /// Drive this stream on its own thread, feeding a bounded handoff queue.
    ///
    /// The queue is closed after the last record, on cancellation, or when
    /// the consumer goes away. The join handle yields the final summary.
    pub fn into_handoff(
        self,
        capacity: usize,
    ) -> Result<(HandoffConsumer<ResultRecord>, JoinHandle<PipelineSummary>), ConfigError> {
        let (mut producer, consumer) = HandoffQueue::bounded(capacity)?;

        let handle = thread::spawn(move || {
            let mut stream = self;
            while let Some(record) = stream.next() {
                if producer.put(record).is_err() {
                    debug!("handoff consumer went away, cancelling run");
                    stream.cancel();
                    // In-flight records are discarded; draining ends the run normally.
                    stream.by_ref().for_each(drop);
                    break;
                }
            }
            // Already closed only if the consumer disconnected
            let _ = producer.close();
            stream.summary()
        });

        Ok((consumer, handle))
    }

    fn classify(&mut self, outcome: HashOutcome) -> ResultRecord {
        self.summary.total_files += 1;

        match outcome {
            HashOutcome::Failure { path, error } => {
                self.summary.failed += 1;
                warn!(path = %path.display(), "failed to fingerprint: {}", error);
                let message = error.to_string();
                self.events.send(Event::Hash(HashEvent::Error {
                    path: path.clone(),
                    message: message.clone(),
                }));

                ResultRecord {
                    is_duplicate: false,
                    path,
                    payload: Payload::empty(),
                    fingerprint: None,
                    first_seen: None,
                    error: Some(message),
                }
            }
            HashOutcome::Success {
                path,
                fingerprint,
                payload,
            } => {
                let is_new = self.index.check_and_insert(fingerprint, &path);
                let first_seen = if is_new {
                    self.summary.unique += 1;
                    None
                } else {
                    self.summary.duplicates += 1;
                    self.index.first_path(&fingerprint).map(PathBuf::from)
                };

                debug!(path = %path.display(), %fingerprint, duplicate = !is_new, "fingerprinted");
                self.events.send(Event::Hash(HashEvent::FileHashed {
                    path: path.clone(),
                    is_duplicate: !is_new,
                }));

                ResultRecord {
                    is_duplicate: !is_new,
                    path,
                    payload,
                    fingerprint: Some(fingerprint),
                    first_seen,
                    error: None,
                }
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.summary.duration_ms = self.started.elapsed().as_millis() as u64;
        self.summary.cancelled = self.outcomes.is_cancelled();

        let summary = self.summary.clone();
        info!(
            total = summary.total_files,
            unique = summary.unique,
            duplicates = summary.duplicates,
            failed = summary.failed,
            duration_ms = summary.duration_ms,
            cancelled = summary.cancelled,
            "run finished"
        );

        let event = if summary.cancelled {
            PipelineEvent::Cancelled { summary }
        } else {
            PipelineEvent::Completed { summary }
        };
        self.events.send(Event::Pipeline(event));
    }
}

impl Iterator for ResultStream {
    type Item = ResultRecord;

    fn next(&mut self) -> Option<ResultRecord> {
        if self.finished {
            return None;
        }

        match self.outcomes.next_outcome() {
            Some(outcome) => Some(self.classify(outcome)),
            None => {
                self.finish();
                None
            }
        }
    }
}
