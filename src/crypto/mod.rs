//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - BLAKE2b-256 hashing
//! - Merkle root calculation
//! - Ed25519 key management
//! - Mnemonic seeds with deterministic key derivation

pub mod hash;
pub mod keys;
pub mod merkle;
pub mod seed;

pub use hash::{blake2b, hash_all, BlockId, Hash256, HashParseError, OutputId, TransactionId};
pub use keys::{
    verify_hash, KeyError, KeyPair, PublicKey, Specifier, SIGNATURE_ED25519, SIGNATURE_ENTROPY,
};
pub use merkle::merkle_root;
pub use seed::Seed;
