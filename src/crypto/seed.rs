//! Mnemonic seeds and deterministic key derivation
//!
//! A seed holds 128 bits of entropy, shown to the user as a 12-word BIP39
//! phrase. The entropy is hashed into a 32-byte wallet seed, and the key at
//! index `i` is the ed25519 key whose secret seed is
//! `BLAKE2b-256(wallet_seed || u64le(i))`.

use super::hash::{blake2b, hash_all};
use super::keys::{KeyError, KeyPair, PublicKey};
use bip39::{Language, Mnemonic};
use rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Bytes of entropy behind a 12-word phrase
pub const SEED_ENTROPY_SIZE: usize = 16;

/// A wallet seed
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    entropy: [u8; SEED_ENTROPY_SIZE],
    wallet_seed: [u8; 32],
}

impl Seed {
    /// Generate a new random seed
    pub fn generate() -> Self {
        let mut entropy = [0u8; SEED_ENTROPY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut entropy);
        let seed = Self::from_entropy(entropy);
        entropy.zeroize();
        seed
    }

    /// Create a seed from raw entropy
    pub fn from_entropy(entropy: [u8; SEED_ENTROPY_SIZE]) -> Self {
        Self {
            entropy,
            wallet_seed: blake2b(&entropy).0,
        }
    }

    /// Recover a seed from its 12-word phrase
    pub fn from_phrase(phrase: &str) -> Result<Self, KeyError> {
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        let mnemonic = Mnemonic::parse_in(Language::English, &normalized)
            .map_err(|e| KeyError::InvalidSeed(e.to_string()))?;
        let entropy: [u8; SEED_ENTROPY_SIZE] = mnemonic
            .to_entropy()
            .as_slice()
            .try_into()
            .map_err(|_| {
                KeyError::InvalidSeed(format!(
                    "expected 12 words, got {}",
                    mnemonic.word_count()
                ))
            })?;
        Ok(Self::from_entropy(entropy))
    }

    /// The 12-word phrase for this seed
    pub fn phrase(&self) -> String {
        // 16 bytes is always valid BIP39 entropy
        match Mnemonic::from_entropy_in(Language::English, &self.entropy) {
            Ok(mnemonic) => mnemonic.to_string(),
            Err(_) => unreachable!("16-byte entropy is a valid mnemonic length"),
        }
    }

    /// Derive the key pair at `index`
    pub fn key_pair(&self, index: u64) -> KeyPair {
        let secret = hash_all(&[&self.wallet_seed, &index.to_le_bytes()]);
        KeyPair::from_secret_seed(&secret.0)
    }

    /// Derive the public key at `index`
    pub fn public_key(&self, index: u64) -> PublicKey {
        self.key_pair(index).public_key()
    }

    /// Derive the 64-byte ed25519 secret key at `index`
    pub fn secret_key(&self, index: u64) -> zeroize::Zeroizing<[u8; 64]> {
        self.key_pair(index).secret_key_bytes()
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}
