//! # Fingerprint Module
//!
//! Stable content identity for duplicate detection.
//!
//! A fingerprint is the xxh3-128 digest of the whole file, rendered as 32
//! lowercase hex characters. It depends only on the bytes, never on the path
//! or timestamps, so a copied or renamed photo is recognised as the same
//! content. Only byte-identical files match.

use crate::error::DecodeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

const STREAM_CHUNK: usize = 64 * 1024;

/// 128-bit content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(u128);

impl ContentHash {
    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Hex form, as stored in the catalog and used for thumbnail names
    pub fn to_hex(&self) -> String {
        format!("{:032x}", self.0)
    }

    /// First two hex characters, used to shard the thumbnail directory
    pub fn shard(&self) -> String {
        format!("{:02x}", (self.0 >> 120) as u8)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Error returned when a string is not a 32-character hex fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContentHashError(String);

impl fmt::Display for ParseContentHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid content hash: {:?}", self.0)
    }
}

impl std::error::Error for ParseContentHashError {}

impl FromStr for ContentHash {
    type Err = ParseContentHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseContentHashError(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(ContentHash)
            .map_err(|_| ParseContentHashError(s.to_string()))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Fingerprint bytes already in memory
pub fn fingerprint_bytes(bytes: &[u8]) -> ContentHash {
    ContentHash(xxh3_128(bytes))
}

/// Fingerprint a file without loading it whole
pub fn fingerprint_file(path: &Path) -> Result<ContentHash, DecodeError> {
    let io_err = |source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let mut reader = BufReader::with_capacity(STREAM_CHUNK, file);
    let mut hasher = Xxh3::new();
    let mut buf = vec![0u8; STREAM_CHUNK];

    loop {
        let n = reader.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentHash(hasher.digest128()))
}
