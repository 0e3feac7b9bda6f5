//! Multi-signature spending of subsidy outputs
//!
//! An output locked by m-of-n unlock conditions is spent by a transaction
//! that collects m signatures, one participant at a time.
//!
//! # Example
//!
//! ```ignore
//! use multisign::multisig::{cosign, inspect, SignerConfig};
//!
//! // Each participant adds their signature in turn
//! cosign(&mut txn, &alice_seed, &SignerConfig::default(), &params)?;
//! cosign(&mut txn, &bob_seed, &SignerConfig::default(), &params)?;
//!
//! // Transaction is now ready to broadcast
//! assert!(inspect(&txn, &params).is_valid());
//! ```

pub mod inspect;
pub mod signer;

pub use inspect::{
    inspect, InputSummary, InspectionReport, OutputSummary, SignatureCheck, SignatureStatus,
    Validity, Warning,
};
pub use signer::{
    cosign, cosign_with_keys, sign_transaction, KeyIndex, MultisigError, SignOutcome,
    SignedSlot, SignerConfig, DEFAULT_KEY_SEARCH_LIMIT,
};
