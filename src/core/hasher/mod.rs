//! # Hasher Module
//!
//! Computes exact-content fingerprints for files.
//!
//! ## How It Works
//! 1. Open the file and read it in fixed-size chunks (8 KiB by default)
//! 2. Feed each chunk to a streaming 128-bit hash accumulator
//! 3. Optionally keep the bytes (raw or zlib-compressed) for consumers
//!    that want to display the image, up to a size cap
//!
//! Chunked reading bounds memory when retention is off, whatever the file size.
//!
//! ## Example
//! ```rust,ignore
//! use image_dupe_finder::core::hasher::{FingerprintKind, HasherConfig, PayloadMode};
//!
//! let hasher = HasherConfig::new()
//!     .algorithm(FingerprintKind::Md5)
//!     .payload(PayloadMode::Discard);
//!
//! let outcome = hasher.hash_file(path);
//! ```

mod fingerprint;
mod payload;

pub use fingerprint::{Fingerprint, FingerprintKind};
pub use payload::{Payload, PayloadEncoding, PayloadMode, DEFAULT_MAX_PAYLOAD_BYTES};

use crate::error::{ConfigError, HashError};
use fingerprint::Accumulator;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

/// Default read size per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Result of fingerprinting one candidate
#[derive(Debug)]
pub enum HashOutcome {
    /// The whole file was read and hashed
    Success {
        path: PathBuf,
        fingerprint: Fingerprint,
        payload: Payload,
    },
    /// The file could not be read; it is reported once and never retried
    Failure { path: PathBuf, error: HashError },
}

impl HashOutcome {
    /// Path of the candidate this outcome describes
    pub fn path(&self) -> &Path {
        match self {
            HashOutcome::Success { path, .. } | HashOutcome::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HashOutcome::Success { .. })
    }
}

/// Configuration for fingerprinting files
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash function
    algorithm: FingerprintKind,
    /// Bytes read per chunk
    chunk_size: usize,
    /// Byte retention for consumers
    payload: PayloadMode,
}

impl HasherConfig {
    /// MD5, 8 KiB chunks, compressed payloads up to 64 MiB
    pub fn new() -> Self {
        Self {
            algorithm: FingerprintKind::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            payload: PayloadMode::default(),
        }
    }

    /// Set the hash function
    pub fn algorithm(mut self, algorithm: FingerprintKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set payload retention
    pub fn payload(mut self, payload: PayloadMode) -> Self {
        self.payload = payload;
        self
    }

    pub fn algorithm_kind(&self) -> FingerprintKind {
        self.algorithm
    }

    pub fn payload_mode(&self) -> PayloadMode {
        self.payload
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }

    /// Fingerprint one file. Never panics and never returns early on error:
    /// any failure becomes [`HashOutcome::Failure`].
    pub fn hash_file(&self, path: PathBuf) -> HashOutcome {
        match self.read_and_hash(&path) {
            Ok((fingerprint, payload)) => HashOutcome::Success {
                path,
                fingerprint,
                payload,
            },
            Err(error) => HashOutcome::Failure { path, error },
        }
    }

    fn read_and_hash(&self, path: &Path) -> Result<(Fingerprint, Payload), HashError> {
        let io_error = |e: std::io::Error| HashError::from_io(path.to_path_buf(), e);

        let mut file = File::open(path).map_err(io_error)?;
        let cap = self.payload.max_bytes();

        // Pre-size the retention buffer when the whole file fits under the cap.
        let mut retained = match (cap, file.metadata()) {
            (Some(cap), Ok(meta)) if meta.len() <= cap => Some(Vec::with_capacity(meta.len() as usize)),
            (Some(_), Ok(_)) => None,
            (Some(_), Err(_)) => Some(Vec::new()),
            (None, _) => None,
        };

        let mut accumulator = Accumulator::new(self.algorithm);
        let mut chunk = vec![0u8; self.chunk_size.max(1)];

        loop {
            let read = match file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(io_error(e)),
            };
            accumulator.update(&chunk[..read]);

            if let Some(buffer) = retained.as_mut() {
                if cap.is_some_and(|cap| (buffer.len() + read) as u64 > cap) {
                    // Over the cap: the payload will be empty, never truncated.
                    retained = None;
                } else {
                    buffer.extend_from_slice(&chunk[..read]);
                }
            }
        }

        let fingerprint = accumulator.finish();
        let payload = match (self.payload, retained) {
            (PayloadMode::Raw { .. }, Some(bytes)) => Payload::raw(bytes),
            (PayloadMode::Compressed { .. }, Some(bytes)) => {
                Payload::compress(&bytes).map_err(|e| HashError::Compression {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
            _ => Payload::empty(),
        };

        Ok((fingerprint, payload))
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}
