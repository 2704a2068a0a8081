//! File bytes forwarded to consumers that want to render the image.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// Largest file whose bytes are kept by default (64 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// How payload bytes are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadEncoding {
    /// Bytes exactly as read from disk
    Raw,
    /// zlib stream at maximum compression
    Zlib,
}

/// Whether workers retain file bytes, and how
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadMode {
    /// Hash only; every payload is empty
    Discard,
    /// Keep raw bytes for files up to `max_bytes`
    Raw { max_bytes: u64 },
    /// Keep zlib-compressed bytes for files up to `max_bytes`
    Compressed { max_bytes: u64 },
}

impl PayloadMode {
    /// Size cap, if bytes are retained at all
    pub fn max_bytes(&self) -> Option<u64> {
        match self {
            PayloadMode::Discard => None,
            PayloadMode::Raw { max_bytes } | PayloadMode::Compressed { max_bytes } => Some(*max_bytes),
        }
    }
}

impl Default for PayloadMode {
    fn default() -> Self {
        PayloadMode::Compressed {
            max_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

/// A file's bytes, owned by whoever holds the record.
///
/// Empty when retention was disabled, the file exceeded the cap, or it
/// could not be read. Consumers must cope with an empty payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    encoding: PayloadEncoding,
    bytes: Vec<u8>,
}

impl Payload {
    /// A payload with no bytes
    pub fn empty() -> Self {
        Self::raw(Vec::new())
    }

    /// Uncompressed bytes
    pub fn raw(bytes: Vec<u8>) -> Self {
        Self {
            encoding: PayloadEncoding::Raw,
            bytes,
        }
    }

    /// Compress `data` into a zlib payload
    pub fn compress(data: &[u8]) -> io::Result<Self> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
        encoder.write_all(data)?;
        Ok(Self {
            encoding: PayloadEncoding::Zlib,
            bytes: encoder.finish()?,
        })
    }

    pub fn encoding(&self) -> PayloadEncoding {
        self.encoding
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Encoded length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Original file bytes, inflating if needed
    pub fn decode(&self) -> io::Result<Vec<u8>> {
        match self.encoding {
            PayloadEncoding::Raw => Ok(self.bytes.clone()),
            PayloadEncoding::Zlib => {
                let mut decoded = Vec::new();
                ZlibDecoder::new(self.bytes.as_slice()).read_to_end(&mut decoded)?;
                Ok(decoded)
            }
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Payload")
            .field("encoding", &self.encoding)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_decodes_to_nothing() {
        let payload = Payload::empty();
        assert!(payload.is_empty());
        assert!(payload.decode().unwrap().is_empty());
    }

    #[test]
    fn compressed_payload_inflates_to_original() {
        let data = vec![7u8; 10_000];
        let payload = Payload::compress(&data).unwrap();

        assert_eq!(payload.encoding(), PayloadEncoding::Zlib);
        assert!(payload.len() < data.len());
        assert_eq!(payload.decode().unwrap(), data);
    }

    #[test]
    fn corrupt_zlib_payload_fails_to_decode() {
        let payload = Payload {
            encoding: PayloadEncoding::Zlib,
            bytes: b"definitely not zlib".to_vec(),
        };
        assert!(payload.decode().is_err());
    }

    #[test]
    fn discard_mode_has_no_cap() {
        assert_eq!(PayloadMode::Discard.max_bytes(), None);
        assert_eq!(
            PayloadMode::default().max_bytes(),
            Some(DEFAULT_MAX_PAYLOAD_BYTES)
        );
    }
}
