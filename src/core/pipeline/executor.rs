//! Pipeline configuration and execution.

use super::pool;
use super::stream::{ResultRecord, ResultStream};
use super::CancellationToken;
use crate::core::hasher::{FingerprintKind, HasherConfig, PayloadMode};
use crate::core::scanner::{Crawler, FileCandidate, ScanConfig};
use crate::error::{ConfigError, DuplicateFinderError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelineSummary, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of a run collected into memory
#[derive(Debug)]
pub struct PipelineResult {
    /// Every record, in completion order
    pub records: Vec<ResultRecord>,
    /// Final counts
    pub summary: PipelineSummary,
}

impl PipelineResult {
    /// Records whose fingerprint was already taken
    pub fn duplicates(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.is_duplicate)
    }

    /// Records that could not be read
    pub fn failures(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| r.is_failure())
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory to crawl
    pub root: PathBuf,
    /// Crawler configuration
    pub scan: ScanConfig,
    /// Fingerprint configuration
    pub hasher: HasherConfig,
    /// Parallel fingerprint workers
    pub workers: usize,
    /// Tasks allowed in flight ahead of the consumer (None = 2 x workers)
    pub prefetch: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            scan: ScanConfig::default(),
            hasher: HasherConfig::default(),
            workers: rayon::current_num_threads().max(1),
            prefetch: None,
        }
    }
}

impl PipelineConfig {
    /// Effective prefetch window
    pub fn prefetch_window(&self) -> usize {
        self.prefetch.unwrap_or(self.workers.saturating_mul(2))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.prefetch_window() == 0 {
            return Err(ConfigError::InvalidPrefetch);
        }
        if self.scan.filter().is_empty() {
            return Err(ConfigError::EmptyExtensions);
        }
        self.hasher.validate()
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    events: EventSender,
    cancel: CancellationToken,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            events: null_sender(),
            cancel: CancellationToken::new(),
        }
    }

    /// Directory to crawl
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Only crawl files with these extensions (case-insensitive)
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.scan.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    /// Follow symbolic links while crawling
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.scan.follow_symlinks = follow;
        self
    }

    /// Limit crawl depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.scan.max_depth = Some(depth);
        self
    }

    /// Set the fingerprint algorithm
    pub fn algorithm(mut self, algorithm: FingerprintKind) -> Self {
        self.config.hasher = self.config.hasher.algorithm(algorithm);
        self
    }

    /// Set payload retention
    pub fn payload(mut self, payload: PayloadMode) -> Self {
        self.config.hasher = self.config.hasher.payload(payload);
        self
    }

    /// Set the read chunk size
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.hasher = self.config.hasher.chunk_size(chunk_size);
        self
    }

    /// Number of parallel fingerprint workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Tasks allowed in flight ahead of the consumer
    pub fn prefetch(mut self, prefetch: usize) -> Self {
        self.config.prefetch = Some(prefetch);
        self
    }

    /// Report progress through `events`
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Cancelling `token` stops every run of the built pipeline
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            events: self.events,
            cancel: self.cancel,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The duplicate detection pipeline.
///
/// Each call to [`Pipeline::process`] is an independent run with its own
/// crawl, worker pool and empty dedup index.
pub struct Pipeline {
    config: PipelineConfig,
    events: EventSender,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Token that cancels every run of this pipeline
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Start a run over the configured root.
    ///
    /// Configuration and root are validated before any thread starts.
    pub fn process(&self) -> Result<ResultStream, DuplicateFinderError> {
        self.config.validate()?;
        let crawler = Crawler::new(&self.config.root, &self.config.scan)?;

        self.events.send(Event::Scan(ScanEvent::Started {
            root: self.config.root.clone(),
        }));
        self.start(crawler.with_events(self.events.clone()))
    }

    /// Start a run over an explicit candidate list instead of a crawl.
    pub fn process_candidates<I>(&self, candidates: I) -> Result<ResultStream, DuplicateFinderError>
    where
        I: IntoIterator<Item = FileCandidate>,
        I::IntoIter: Send + 'static,
    {
        self.config.validate()?;
        self.start(candidates.into_iter())
    }

    /// Run to completion and collect every record
    pub fn run(&self) -> Result<PipelineResult, DuplicateFinderError> {
        let mut stream = self.process()?;
        let records: Vec<_> = stream.by_ref().collect();
        Ok(PipelineResult {
            records,
            summary: stream.summary(),
        })
    }

    fn start<I>(&self, candidates: I) -> Result<ResultStream, DuplicateFinderError>
    where
        I: Iterator<Item = FileCandidate> + Send + 'static,
    {
        let workers = self.config.workers;
        let prefetch = self.config.prefetch_window();

        info!(
            root = %self.config.root.display(),
            workers,
            prefetch,
            algorithm = %self.config.hasher.algorithm_kind(),
            "starting run"
        );
        self.events
            .send(Event::Pipeline(PipelineEvent::Started { workers, prefetch }));

        let outcomes = pool::spawn(
            candidates,
            self.config.hasher.clone(),
            workers,
            prefetch,
            self.cancel.child(),
        )?;

        Ok(ResultStream::new(outcomes, self.events.clone()))
    }
}

/// Crawl `root` and stream a record per matching file.
///
/// `extensions` defaults to the common raster-image list.
pub fn process(root: impl AsRef<Path>, extensions: Option<&[&str]>) -> Result<ResultStream, DuplicateFinderError> {
    let mut builder = Pipeline::builder().root(root.as_ref());
    if let Some(extensions) = extensions {
        builder = builder.extensions(extensions.iter().copied());
    }
    builder.build().process()
}
