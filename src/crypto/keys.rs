//! Ed25519 key management
//!
//! Provides tagged public keys, signing key pairs, and signature
//! verification over 32-byte digests.

use super::hash::Hash256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use zeroize::Zeroizing;

/// Length of a specifier in bytes
pub const SPECIFIER_SIZE: usize = 16;

/// Length of an ed25519 public key
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Length of an ed25519 signature
pub const ED25519_SIGNATURE_SIZE: usize = 64;

/// Errors that can occur during key operations
#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("Invalid specifier: {0}")]
    InvalidSpecifier(String),
}

// =============================================================================
// Specifier
// =============================================================================

/// A 16-byte, zero-padded ASCII tag
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Specifier(pub [u8; SPECIFIER_SIZE]);

impl Specifier {
    /// Build a specifier from a string of at most 16 bytes
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        assert!(bytes.len() <= SPECIFIER_SIZE);
        let mut out = [0u8; SPECIFIER_SIZE];
        let mut i = 0;
        while i < bytes.len() {
            out[i] = bytes[i];
            i += 1;
        }
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; SPECIFIER_SIZE] {
        &self.0
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .0
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(SPECIFIER_SIZE);
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

impl fmt::Debug for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Specifier({})", self)
    }
}

impl FromStr for Specifier {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > SPECIFIER_SIZE || !s.is_ascii() {
            return Err(KeyError::InvalidSpecifier(s.to_string()));
        }
        let mut out = [0u8; SPECIFIER_SIZE];
        out[..s.len()].copy_from_slice(s.as_bytes());
        Ok(Self(out))
    }
}

/// Ed25519 signature algorithm
pub const SIGNATURE_ED25519: Specifier = Specifier::new("ed25519");

/// Entropy "algorithm": keys that can never sign
pub const SIGNATURE_ENTROPY: Specifier = Specifier::new("entropy");

// =============================================================================
// Public Key
// =============================================================================

/// A public key tagged with its signature algorithm
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey {
    pub algorithm: Specifier,
    pub key: Vec<u8>,
}

impl PublicKey {
    /// Wrap raw ed25519 public key bytes
    pub fn ed25519(key: [u8; ED25519_PUBLIC_KEY_SIZE]) -> Self {
        Self {
            algorithm: SIGNATURE_ED25519,
            key: key.to_vec(),
        }
    }

    pub fn is_ed25519(&self) -> bool {
        self.algorithm == SIGNATURE_ED25519
    }

    /// Parse a comma-separated list of keys, e.g. `ed25519:aa..,ed25519:bb..`
    pub fn parse_list(s: &str) -> Result<Vec<Self>, KeyError> {
        s.split(',').map(|part| part.trim().parse()).collect()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, hex::encode(&self.key))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (algorithm, key) = s
            .split_once(':')
            .ok_or_else(|| KeyError::InvalidPublicKey(format!("missing algorithm in {:?}", s)))?;
        if key.contains(':') {
            return Err(KeyError::InvalidPublicKey(format!("malformed key {:?}", s)));
        }
        let key = hex::decode(key).map_err(|e| KeyError::InvalidPublicKey(e.to_string()))?;
        Ok(Self {
            algorithm: algorithm.parse()?,
            key,
        })
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepted JSON shapes: the `"alg:hex"` string, or the legacy object form
#[derive(Deserialize)]
#[serde(untagged)]
enum PublicKeyRepr {
    Text(String),
    Object { algorithm: String, key: String },
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PublicKeyRepr::deserialize(deserializer)? {
            PublicKeyRepr::Text(s) => s.parse().map_err(de::Error::custom),
            PublicKeyRepr::Object { algorithm, key } => Ok(PublicKey {
                algorithm: algorithm.parse().map_err(de::Error::custom)?,
                key: BASE64.decode(key).map_err(de::Error::custom)?,
            }),
        }
    }
}

// =============================================================================
// Key Pair
// =============================================================================

/// An ed25519 signing key pair
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Create a key pair from a 32-byte secret seed
    pub fn from_secret_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Raw public key bytes
    pub fn public_key_bytes(&self) -> [u8; ED25519_PUBLIC_KEY_SIZE] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Tagged public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey::ed25519(self.public_key_bytes())
    }

    /// The 64-byte expanded secret key (secret seed || public key)
    pub fn secret_key_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Sign a digest
    pub fn sign_hash(&self, hash: &Hash256) -> [u8; ED25519_SIGNATURE_SIZE] {
        self.signing_key.sign(hash.as_bytes()).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({})", self.public_key())
    }
}

/// Verify an ed25519 signature over a digest
///
/// The key and signature are read as fixed-size arrays the way the ledger
/// decodes them: trailing bytes are ignored and short input is zero-filled.
/// Non-ed25519 keys never verify.
pub fn verify_hash(public_key: &PublicKey, hash: &Hash256, signature: &[u8]) -> bool {
    if !public_key.is_ed25519() {
        return false;
    }
    let key_bytes: [u8; ED25519_PUBLIC_KEY_SIZE] = fixed_prefix(&public_key.key);
    let sig_bytes: [u8; ED25519_SIGNATURE_SIZE] = fixed_prefix(signature);
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    verifying_key
        .verify(hash.as_bytes(), &Signature::from_bytes(&sig_bytes))
        .is_ok()
}

fn fixed_prefix<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::blake2b;

    #[test]
    fn test_specifier_display() {
        assert_eq!(SIGNATURE_ED25519.to_string(), "ed25519");
        assert_eq!(&SIGNATURE_ED25519.0[..8], b"ed25519\0");
        assert_eq!("ed25519".parse::<Specifier>().unwrap(), SIGNATURE_ED25519);
        assert!("a specifier that is too long".parse::<Specifier>().is_err());
    }

    #[test]
    fn test_public_key_string_round_trip() {
        let kp = KeyPair::from_secret_seed(&[7u8; 32]);
        let pk = kp.public_key();
        let text = pk.to_string();
        assert!(text.starts_with("ed25519:"));
        assert_eq!(text.parse::<PublicKey>().unwrap(), pk);
    }

    #[test]
    fn test_public_key_parse_errors() {
        assert!("ed25519".parse::<PublicKey>().is_err());
        assert!("ed25519:zz".parse::<PublicKey>().is_err());
        assert!("ed25519:aa:bb".parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_public_key_legacy_json() {
        let json = r#"{"algorithm":"ed25519","key":"AAEC"}"#;
        let pk: PublicKey = serde_json::from_str(json).unwrap();
        assert_eq!(pk.key, vec![0, 1, 2]);
        assert!(pk.is_ed25519());
    }

    #[test]
    fn test_sign_and_verify() {
        let kp = KeyPair::from_secret_seed(&[1u8; 32]);
        let hash = blake2b(b"Hello, ledger!");
        let sig = kp.sign_hash(&hash);

        assert!(verify_hash(&kp.public_key(), &hash, &sig));
        assert!(!verify_hash(&kp.public_key(), &blake2b(b"other"), &sig));
        assert!(!verify_hash(&kp.public_key(), &hash, &sig[..32]));
    }

    #[test]
    fn test_verify_reads_fixed_size_prefix() {
        let kp = KeyPair::from_secret_seed(&[1u8; 32]);
        let hash = blake2b(b"Hello, ledger!");
        let sig = kp.sign_hash(&hash);

        let mut long_sig = sig.to_vec();
        long_sig.extend_from_slice(&[0xff; 8]);
        assert!(verify_hash(&kp.public_key(), &hash, &long_sig));

        let mut long_key = kp.public_key();
        long_key.key.extend_from_slice(&[0xff; 8]);
        assert!(verify_hash(&long_key, &hash, &sig));

        let mut short_key = kp.public_key();
        short_key.key.truncate(16);
        assert!(!verify_hash(&short_key, &hash, &sig));
    }

    #[test]
    fn test_verify_rejects_other_algorithms() {
        let kp = KeyPair::from_secret_seed(&[1u8; 32]);
        let hash = blake2b(b"data");
        let sig = kp.sign_hash(&hash);
        let mut pk = kp.public_key();
        pk.algorithm = SIGNATURE_ENTROPY;
        assert!(!verify_hash(&pk, &hash, &sig));
    }

    #[test]
    fn test_secret_key_contains_public_key() {
        let kp = KeyPair::from_secret_seed(&[9u8; 32]);
        assert_eq!(&kp.secret_key_bytes()[32..], &kp.public_key_bytes());
    }
}
