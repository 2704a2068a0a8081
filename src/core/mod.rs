//! # Core Module
//!
//! The GUI-agnostic duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Crawls a directory tree for candidate images
//! - `hasher` - Computes content fingerprints and payloads
//! - `dedup` - Records which fingerprints a run has already seen
//! - `pipeline` - Worker pool, result stream and run orchestration
//! - `handoff` - Bounded queue between the pipeline and a slow consumer

pub mod dedup;
pub mod handoff;
pub mod hasher;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use dedup::DedupIndex;
pub use handoff::{HandoffConsumer, HandoffProducer, HandoffQueue};
pub use hasher::{Fingerprint, FingerprintKind, HashOutcome, Payload};
pub use pipeline::{Pipeline, ResultRecord, ResultStream};
pub use scanner::{crawl, Crawler, FileCandidate};
