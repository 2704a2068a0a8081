//! # Image Dupe Finder
//!
//! Finds byte-identical image files in a directory tree and streams the
//! verdict for each file as soon as it has been fingerprinted.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - the pipeline only reports, it never touches files
//! - **One bad file, one bad record** - read errors never abort a run
//! - **Stream, don't batch** - consumers see results in completion order
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - crawler, fingerprint workers, dedup index, result stream, handoff queue
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::pipeline::{
    process, CancellationToken, Pipeline, PipelineBuilder, PipelineSummary, ResultRecord,
    ResultStream,
};
pub use error::{DuplicateFinderError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// `RUST_LOG` controls the filter; `default_directive` applies when it is unset.
/// Calling it more than once is a no-op.
pub fn init_tracing(default_directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
