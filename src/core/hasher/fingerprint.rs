//! 128-bit content fingerprints and the streaming accumulators behind them.

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// Digest of a file's full byte content.
///
/// Two files are duplicates iff their fingerprints are bit-equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Wrap raw digest bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Fingerprint a complete in-memory buffer
    pub fn of(kind: FingerprintKind, data: &[u8]) -> Self {
        let mut accumulator = Accumulator::new(kind);
        accumulator.update(data);
        accumulator.finish()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

/// Hash function used to fingerprint files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerprintKind {
    /// MD5 - cryptographic digest, the default
    #[default]
    Md5,
    /// XXH3-128 - much faster, not cryptographic
    Xxh3,
}

impl fmt::Display for FingerprintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintKind::Md5 => write!(f, "md5"),
            FingerprintKind::Xxh3 => write!(f, "xxh3-128"),
        }
    }
}

/// Incremental hash state fed one chunk at a time
pub(crate) enum Accumulator {
    Md5(Md5),
    Xxh3(Box<Xxh3>),
}

impl Accumulator {
    pub(crate) fn new(kind: FingerprintKind) -> Self {
        match kind {
            FingerprintKind::Md5 => Accumulator::Md5(Md5::new()),
            FingerprintKind::Xxh3 => Accumulator::Xxh3(Box::new(Xxh3::new())),
        }
    }

    pub(crate) fn update(&mut self, chunk: &[u8]) {
        match self {
            Accumulator::Md5(hasher) => hasher.update(chunk),
            Accumulator::Xxh3(hasher) => hasher.update(chunk),
        }
    }

    pub(crate) fn finish(self) -> Fingerprint {
        match self {
            Accumulator::Md5(hasher) => Fingerprint(hasher.finalize().into()),
            Accumulator::Xxh3(hasher) => Fingerprint(hasher.digest128().to_be_bytes()),
        }
    }
}
