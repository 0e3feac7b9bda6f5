//! BLAKE2b-256 hashing for the ledger
//!
//! Every identifier on the ledger (transaction IDs, output IDs, unlock
//! hashes, signature digests) is a 32-byte BLAKE2b digest.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// BLAKE2b with a 256-bit output
pub type Blake2b256 = Blake2b<U32>;

/// Length of a hash in bytes
pub const HASH_SIZE: usize = 32;

/// Errors parsing a hex-encoded hash
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} hex characters, got {got}")]
    InvalidLength { expected: usize, got: usize },
}

/// A 32-byte BLAKE2b-256 digest
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256(pub [u8; HASH_SIZE]);

/// ID of a block
pub type BlockId = Hash256;

/// ID of a transaction
pub type TransactionId = Hash256;

/// ID of a siacoin output, siafund output or file contract
pub type OutputId = Hash256;

impl Hash256 {
    /// The all-zero hash
    pub const fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash256 {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self)
    }
}

impl FromStr for Hash256 {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HASH_SIZE * 2 {
            return Err(HashParseError::InvalidLength {
                expected: HASH_SIZE * 2,
                got: s.len(),
            });
        }
        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Computes the BLAKE2b-256 hash of the input data
pub fn blake2b(data: &[u8]) -> Hash256 {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

/// Hashes the concatenation of several byte strings
pub fn hash_all(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    Hash256(hasher.finalize().into())
}
