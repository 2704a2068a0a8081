//! Fingerprint worker pool.
//!
//! A feeder thread pulls candidates from the crawler and spawns one hashing
//! task per file on a dedicated rayon pool. Outcomes come back over a channel
//! in completion order. A permit channel of `prefetch` slots bounds how many
//! tasks may be dispatched but not yet consumed: the feeder takes a permit
//! before each dispatch and the consumer returns one per outcome it reads.
//! The feeder re-checks cancellation while it waits for a permit.

use super::CancellationToken;
use crate::core::hasher::{HashOutcome, HasherConfig};
use crate::core::scanner::FileCandidate;
use crate::error::DuplicateFinderError;
use crossbeam_channel::{bounded, unbounded, Receiver, SendTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// How often a feeder blocked on the prefetch window re-checks cancellation
const PERMIT_POLL: Duration = Duration::from_millis(25);

/// Completion-ordered outcomes from a running pool.
///
/// Ends once every candidate has been hashed, or after cancellation once
/// in-flight tasks drain. Dropping it cancels the run.
pub(crate) struct OutcomeStream {
    outcomes: Receiver<HashOutcome>,
    permits: Receiver<()>,
    cancel: CancellationToken,
    feeder: Option<JoinHandle<()>>,
}

/// Start hashing `candidates` on `workers` threads with at most `prefetch` tasks in flight.
pub(crate) fn spawn<I>(
    candidates: I,
    hasher: HasherConfig,
    workers: usize,
    prefetch: usize,
    cancel: CancellationToken,
) -> Result<OutcomeStream, DuplicateFinderError>
where
    I: Iterator<Item = FileCandidate> + Send + 'static,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("fingerprint-{}", i))
        .build()
        .map_err(|e| DuplicateFinderError::WorkerPool(e.to_string()))?;

    let (outcome_tx, outcome_rx) = unbounded();
    let (permit_tx, permit_rx) = bounded::<()>(prefetch);
    let feeder_cancel = cancel.clone();

    let feeder = thread::Builder::new()
        .name("fingerprint-feeder".to_string())
        .spawn(move || {
            let cancel = feeder_cancel;
            let mut dispatched = 0usize;

            // The scope returns only after every spawned task has finished.
            pool.in_place_scope(|scope| {
                for path in candidates {
                    if !acquire_permit(&permit_tx, &cancel) {
                        break;
                    }

                    dispatched += 1;
                    let outcome_tx = outcome_tx.clone();
                    let hasher = &hasher;
                    let cancel = &cancel;
                    scope.spawn(move |_| {
                        // Queued tasks are abandoned once the run is cancelled.
                        if cancel.is_cancelled() {
                            return;
                        }
                        let _ = outcome_tx.send(hasher.hash_file(path));
                    });
                }
            });

            debug!(dispatched, cancelled = cancel.is_cancelled(), "feeder finished");
        })
        .map_err(|e| DuplicateFinderError::WorkerPool(e.to_string()))?;

    Ok(OutcomeStream {
        outcomes: outcome_rx,
        permits: permit_rx,
        cancel,
        feeder: Some(feeder),
    })
}

/// Wait for a free prefetch slot. `false` means stop dispatching.
fn acquire_permit(permits: &Sender<()>, cancel: &CancellationToken) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        match permits.send_timeout((), PERMIT_POLL) {
            Ok(()) => return !cancel.is_cancelled(),
            Err(SendTimeoutError::Timeout(())) => continue,
            Err(SendTimeoutError::Disconnected(())) => return false,
        }
    }
}

impl OutcomeStream {
    /// Block until the next worker finishes.
    pub(crate) fn next_outcome(&mut self) -> Option<HashOutcome> {
        match self.outcomes.recv() {
            Ok(outcome) => {
                let _ = self.permits.try_recv();
                Some(outcome)
            }
            Err(_) => {
                // Every sender is gone, so the feeder has left its scope.
                if let Some(feeder) = self.feeder.take() {
                    let _ = feeder.join();
                }
                None
            }
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for OutcomeStream {
    fn drop(&mut self) {
        // Not joined: the feeder notices within one poll and exits after
        // in-flight tasks finish.
        if self.feeder.is_some() {
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::PayloadMode;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("{}.jpg", i));
                fs::write(&path, format!("image {}", i)).unwrap();
                path
            })
            .collect()
    }

    fn hasher() -> HasherConfig {
        HasherConfig::new().payload(PayloadMode::Discard)
    }

    #[test]
    fn every_candidate_yields_one_outcome() {
        let dir = TempDir::new().unwrap();
        let files = write_files(&dir, 25);

        let mut stream = spawn(files.clone().into_iter(), hasher(), 4, 8, CancellationToken::new()).unwrap();
        let mut seen = Vec::new();
        while let Some(outcome) = stream.next_outcome() {
            assert!(outcome.is_success());
            seen.push(outcome.path().to_path_buf());
        }

        seen.sort();
        let mut expected = files;
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn failures_do_not_stop_other_work() {
        let dir = TempDir::new().unwrap();
        let mut files = write_files(&dir, 5);
        files.insert(2, dir.path().join("missing.jpg"));

        let mut stream = spawn(files.into_iter(), hasher(), 2, 4, CancellationToken::new()).unwrap();
        let mut successes = 0;
        let mut failures = 0;
        while let Some(outcome) = stream.next_outcome() {
            if outcome.is_success() {
                successes += 1;
            } else {
                failures += 1;
            }
        }

        assert_eq!(successes, 5);
        assert_eq!(failures, 1);
    }

    #[test]
    fn prefetch_window_bounds_dispatch_ahead_of_consumer() {
        let dir = TempDir::new().unwrap();
        let files = write_files(&dir, 20);
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let candidates = files.into_iter().inspect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let prefetch = 3;
        let mut stream = spawn(candidates, hasher(), 2, prefetch, CancellationToken::new()).unwrap();

        // Nothing consumed yet: the feeder holds every permit and has pulled
        // at most one more candidate while waiting for the next.
        thread::sleep(Duration::from_millis(200));
        assert!(pulled.load(Ordering::SeqCst) <= prefetch + 1);

        let mut total = 0;
        while stream.next_outcome().is_some() {
            total += 1;
        }
        assert_eq!(total, 20);
    }

    #[test]
    fn cancellation_stops_dispatching() {
        let dir = TempDir::new().unwrap();
        let files = write_files(&dir, 50);
        let cancel = CancellationToken::new();

        let mut stream = spawn(files.into_iter(), hasher(), 1, 2, cancel.clone()).unwrap();
        assert!(stream.next_outcome().is_some());
        cancel.cancel();

        let mut remaining = 0;
        while stream.next_outcome().is_some() {
            remaining += 1;
        }
        assert!(stream.is_cancelled());
        assert!(remaining < 49);
    }
}
