//! # Dedup Module
//!
//! Per-run record of which fingerprints have been seen and by whom.
//!
//! [`DedupIndex`] takes `&mut self`, so the borrow checker already makes its
//! owner the single serialization point. [`SharedDedupIndex`] wraps it in a
//! mutex for callers that must check from several threads.
//!
//! Neither is persisted: the index lives exactly as long as one run.

mod shared;

pub use shared::SharedDedupIndex;

use super::hasher::Fingerprint;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Mapping fingerprint -> first path seen.
///
/// Each fingerprint is written once, by the call that first reported it.
#[derive(Debug, Default)]
pub struct DedupIndex {
    first_seen: HashMap<Fingerprint, PathBuf>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `fingerprint` for `path` if it is new.
    ///
    /// Returns `true` when the fingerprint was unseen and is now recorded,
    /// `false` when an earlier path already holds it (that path is kept).
    pub fn check_and_insert(&mut self, fingerprint: Fingerprint, path: &Path) -> bool {
        match self.first_seen.entry(fingerprint) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                true
            }
        }
    }

    /// Path that first claimed `fingerprint`
    pub fn first_path(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.first_seen.get(fingerprint).map(PathBuf::as_path)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.first_seen.contains_key(fingerprint)
    }

    /// Number of distinct fingerprints recorded
    pub fn len(&self) -> usize {
        self.first_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_seen.is_empty()
    }
}
