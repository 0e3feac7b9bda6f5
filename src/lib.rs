//! Multisign: m-of-n signing for Foundation subsidy outputs
//!
//! This crate provides the pieces needed to spend and re-key the Foundation
//! subsidy on the Sia ledger:
//! - Deterministic ed25519 keys from a 12-word seed phrase
//! - m-of-n unlock conditions and their addresses
//! - The ledger's transaction model, binary encoding and signature digests
//! - Incremental co-signing, one signature per participant
//! - Standalone validity and human-readable inspection
//! - Scanning a consensus snapshot for unspent subsidy outputs
//! - Broadcasting through a walrus server
//!
//! # Example
//!
//! ```rust
//! use multisign::core::{derive_address, Currency, ProtocolParams, TransactionBuilder};
//! use multisign::crypto::{blake2b, Seed};
//! use multisign::multisig::{cosign, inspect, SignerConfig};
//!
//! // A 2-of-2 address from two keys of one seed
//! let seed = Seed::generate();
//! let keys = vec![seed.public_key(0), seed.public_key(1)];
//! let (uc, address) = derive_address(0, 2, keys).unwrap();
//!
//! // Spend a subsidy output back to the same address
//! let mut txn = TransactionBuilder::new()
//!     .add_input(blake2b(b"subsidy"), uc, Currency::siacoins(100))
//!     .unwrap()
//!     .add_output(address, Currency::siacoins(95))
//!     .unwrap()
//!     .build();
//!
//! // Each signer adds one signature
//! let params = ProtocolParams::default();
//! let config = SignerConfig::with_key_search_limit(2);
//! cosign(&mut txn, &seed, &config, &params).unwrap();
//! cosign(&mut txn, &seed, &config, &params).unwrap();
//! assert!(inspect(&txn, &params).is_valid());
//! ```

pub mod cli;
pub mod core;
pub mod crypto;
pub mod multisig;
pub mod network;
pub mod storage;

// Re-export commonly used types
pub use core::{
    derive_address, standalone_valid, Currency, ProtocolParams, SubsidyRekeyUpdate, Transaction,
    TransactionBuilder, UnlockConditions, UnlockHash,
};
pub use crypto::{KeyPair, PublicKey, Seed};
pub use multisig::{cosign, inspect, InspectionReport, SignerConfig};
pub use network::WalrusClient;
pub use storage::{ConsensusSnapshot, ConsensusStore};
