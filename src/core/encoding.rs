//! Canonical binary encoding
//!
//! Every hash on the ledger is taken over this encoding, so it must match
//! byte for byte:
//! - integers are 8-byte little-endian
//! - booleans are a single byte
//! - fixed-size arrays (hashes, specifiers) are written raw
//! - byte strings and lists are prefixed with their length as a `u64`

use crate::crypto::{blake2b, Hash256, PublicKey, Specifier};
use thiserror::Error;

/// Encoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("unexpected end of data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("length prefix {0} exceeds remaining data")]
    LengthTooLarge(u64),
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),
}

// =============================================================================
// Encoder
// =============================================================================

/// Accumulates the canonical encoding of one or more objects
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn write_bool(&mut self, v: bool) {
        self.buf.push(v as u8);
    }

    /// Write a list or byte-string length
    pub fn write_len(&mut self, len: usize) {
        self.write_u64(len as u64);
    }

    /// Write bytes with no length prefix
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a length-prefixed byte string
    pub fn write_prefixed(&mut self, bytes: &[u8]) {
        self.write_len(bytes.len());
        self.write_raw(bytes);
    }

    pub fn encode<T: SiaEncode + ?Sized>(&mut self, value: &T) {
        value.encode(self);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// BLAKE2b-256 of everything written so far
    pub fn hash(&self) -> Hash256 {
        blake2b(&self.buf)
    }
}

/// Types with a canonical binary encoding
pub trait SiaEncode {
    fn encode(&self, e: &mut Encoder);

    fn to_bytes(&self) -> Vec<u8> {
        let mut e = Encoder::new();
        self.encode(&mut e);
        e.into_bytes()
    }
}

impl SiaEncode for u64 {
    fn encode(&self, e: &mut Encoder) {
        e.write_u64(*self);
    }
}

impl SiaEncode for bool {
    fn encode(&self, e: &mut Encoder) {
        e.write_bool(*self);
    }
}

impl SiaEncode for Hash256 {
    fn encode(&self, e: &mut Encoder) {
        e.write_raw(self.as_bytes());
    }
}

impl SiaEncode for Specifier {
    fn encode(&self, e: &mut Encoder) {
        e.write_raw(self.as_bytes());
    }
}

impl SiaEncode for PublicKey {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.algorithm);
        e.write_prefixed(&self.key);
    }
}

impl<T: SiaEncode> SiaEncode for [T] {
    fn encode(&self, e: &mut Encoder) {
        e.write_len(self.len());
        for item in self {
            item.encode(e);
        }
    }
}

impl<T: SiaEncode> SiaEncode for Vec<T> {
    fn encode(&self, e: &mut Encoder) {
        self.as_slice().encode(e);
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// Reads canonically encoded values from a byte slice
#[derive(Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn read_raw(&mut self, n: usize) -> Result<&'a [u8], EncodingError> {
        if n > self.data.len() {
            return Err(EncodingError::UnexpectedEof {
                needed: n,
                remaining: self.data.len(),
            });
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], EncodingError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    pub fn read_u64(&mut self) -> Result<u64, EncodingError> {
        Ok(u64::from_le_bytes(self.read_array::<8>()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, EncodingError> {
        match self.read_array::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(EncodingError::InvalidBool(b)),
        }
    }

    pub fn read_prefixed(&mut self) -> Result<&'a [u8], EncodingError> {
        let len = self.read_u64()?;
        if len > self.data.len() as u64 {
            return Err(EncodingError::LengthTooLarge(len));
        }
        self.read_raw(len as usize)
    }

    pub fn decode<T: SiaDecode>(&mut self) -> Result<T, EncodingError> {
        T::decode(self)
    }
}

/// Types that can be read back from their canonical encoding
pub trait SiaDecode: Sized {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError>;

    /// Decode from the start of `bytes`; trailing bytes are ignored, as the
    /// ledger's own decoder does
    fn from_bytes(bytes: &[u8]) -> Result<Self, EncodingError> {
        Self::decode(&mut Decoder::new(bytes))
    }
}

impl SiaDecode for u64 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        d.read_u64()
    }
}

impl SiaDecode for bool {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        d.read_bool()
    }
}

impl SiaDecode for Hash256 {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Hash256(d.read_array()?))
    }
}

impl SiaDecode for Specifier {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(Specifier(d.read_array()?))
    }
}

impl SiaDecode for PublicKey {
    fn decode(d: &mut Decoder<'_>) -> Result<Self, EncodingError> {
        let algorithm = d.decode()?;
        let key = d.read_prefixed()?.to_vec();
        Ok(PublicKey { algorithm, key })
    }
}
