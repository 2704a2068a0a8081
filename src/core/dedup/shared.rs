//! Thread-safe dedup index for multi-threaded callers.

use super::DedupIndex;
use crate::core::hasher::Fingerprint;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable handle to one mutex-guarded [`DedupIndex`].
///
/// `check_and_insert` is linearizable: of any number of threads racing with
/// the same fingerprint, exactly one is told it is new.
#[derive(Debug, Clone, Default)]
pub struct SharedDedupIndex {
    inner: Arc<Mutex<DedupIndex>>,
}

impl SharedDedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`DedupIndex::check_and_insert`]
    pub fn check_and_insert(&self, fingerprint: Fingerprint, path: &Path) -> bool {
        self.lock().check_and_insert(fingerprint, path)
    }

    /// Path that first claimed `fingerprint`
    pub fn first_path(&self, fingerprint: &Fingerprint) -> Option<PathBuf> {
        self.lock().first_path(fingerprint).map(Path::to_path_buf)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Inserts are single map operations; a poisoned index is still consistent.
    fn lock(&self) -> MutexGuard<'_, DedupIndex> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::FingerprintKind;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn racing_threads_get_exactly_one_new() {
        let index = SharedDedupIndex::new();
        let fingerprint = Fingerprint::of(FingerprintKind::Md5, b"same photo");
        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let index = index.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    index.check_and_insert(fingerprint, &PathBuf::from(format!("/{}.jpg", i)))
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|was_new| *was_new)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(index.len(), 1);
        assert!(index.first_path(&fingerprint).is_some());
    }

    #[test]
    fn clones_share_state() {
        let index = SharedDedupIndex::new();
        let other = index.clone();
        let fingerprint = Fingerprint::of(FingerprintKind::Xxh3, b"x");

        assert!(index.check_and_insert(fingerprint, Path::new("/x.png")));
        assert!(!other.check_and_insert(fingerprint, Path::new("/y.png")));
        assert!(!other.is_empty());
    }
}
