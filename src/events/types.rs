//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the duplicate finder pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Crawl events
    Scan(ScanEvent),
    /// Fingerprinting events
    Hash(HashEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events from the crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Crawling has started
    Started { root: PathBuf },
    /// A candidate file was found
    FileFound { path: PathBuf },
    /// An entry was skipped but crawling continues
    Error { path: PathBuf, message: String },
}

/// Events from the fingerprint workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// A file was fingerprinted and classified
    FileHashed { path: PathBuf, is_duplicate: bool },
    /// A file could not be read; it is reported as a failed record
    Error { path: PathBuf, message: String },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started { workers: usize, prefetch: usize },
    /// Pipeline drained every candidate
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled; records already emitted stay valid
    Cancelled { summary: PipelineSummary },
}

/// Summary of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Records emitted so far (unique + duplicates + failed)
    pub total_files: usize,
    /// Files whose fingerprint was seen for the first time
    pub unique: usize,
    /// Files whose fingerprint was already recorded
    pub duplicates: usize,
    /// Files that could not be read
    pub failed: usize,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    /// Whether the run stopped early
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Hash(HashEvent::FileHashed {
            path: PathBuf::from("/photos/a.jpg"),
            is_duplicate: true,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Hash(HashEvent::FileHashed { path, is_duplicate }) => {
                assert_eq!(path, PathBuf::from("/photos/a.jpg"));
                assert!(is_duplicate);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn pipeline_summary_is_serializable() {
        let summary = PipelineSummary {
            total_files: 1000,
            unique: 850,
            duplicates: 140,
            failed: 10,
            duration_ms: 5000,
            cancelled: false,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"duplicates\":140"));
    }
}
