//! # Pipeline Module
//!
//! Orchestrates the full duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Crawl** - lazily enumerate candidate files under the root
//! 2. **Fingerprint** - hash files in parallel, results in completion order
//! 3. **Classify** - check each fingerprint against the run's dedup index
//! 4. **Hand off** - optionally buffer records for a slow consumer
//!
//! ## Parallelism
//! A dedicated rayon pool runs the fingerprint workers; a bounded prefetch
//! window stops it running far ahead of the consumer. Classification runs
//! on the consumer's thread, which is the only owner of the dedup index.

mod cancel;
mod executor;
mod pool;
mod stream;

pub use crate::events::PipelineSummary;
pub use cancel::CancellationToken;
pub use executor::{process, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
pub use stream::{ResultRecord, ResultStream};
