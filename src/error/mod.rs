//! # Error Module
//!
//! User-friendly error types for the duplicate image finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file errors are values** - a file that cannot be read becomes a
//!   failed record, never an `Err` for the whole run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DuplicateFinderError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Handoff queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Errors that occur while crawling a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {reason}")]
    Traversal { path: PathBuf, reason: String },
}

/// Errors that occur while fingerprinting a single file
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File disappeared before it could be read: {path}")]
    Vanished { path: PathBuf },

    #[error("Failed to compress payload for {path}: {reason}")]
    Compression { path: PathBuf, reason: String },
}

impl HashError {
    /// Classify an I/O failure on `path`, separating vanished files from other errors.
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            HashError::Vanished { path }
        } else {
            HashError::Io { path, source }
        }
    }

    /// Path of the file that failed
    pub fn path(&self) -> &PathBuf {
        match self {
            HashError::Io { path, .. }
            | HashError::Vanished { path }
            | HashError::Compression { path, .. } => path,
        }
    }
}

/// Errors returned by the handoff queue
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("Queue is closed")]
    Closed,

    #[error("Queue is full")]
    Full,

    #[error("Queue consumer has gone away")]
    Disconnected,
}

/// Invalid pipeline configuration, reported before any work starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker count must be at least 1")]
    InvalidWorkers,

    #[error("Prefetch window must be at least 1")]
    InvalidPrefetch,

    #[error("Queue capacity must be at least 1")]
    InvalidCapacity,

    #[error("Chunk size must be at least 1 byte")]
    InvalidChunkSize,

    #[error("At least one file extension is required")]
    EmptyExtensions,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DuplicateFinderError>;
