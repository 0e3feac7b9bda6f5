//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Canonical binary encoding
//! - Currency amounts
//! - Unlock conditions and addresses
//! - Transactions (inputs, outputs, signatures, signature digests)
//! - Subsidy outputs and address updates
//! - Standalone validity
//! - Protocol parameters

pub mod currency;
pub mod encoding;
pub mod json;
pub mod params;
pub mod subsidy;
pub mod transaction;
pub mod unlock;
pub mod validation;

pub use currency::{Currency, CurrencyError, HASTINGS_PER_SC};
pub use encoding::{Decoder, Encoder, EncodingError, SiaDecode, SiaEncode};
pub use params::{
    ProtocolParams, ASIC_HARDFORK_HEIGHT, BLOCK_SIZE_LIMIT, FOUNDATION_HARDFORK_HEIGHT,
    FOUNDATION_SUBSIDY_FREQUENCY,
};
pub use subsidy::{subsidy_output_id, ArbitraryData, SubsidyRekeyUpdate, SPECIFIER_FOUNDATION};
pub use transaction::{
    CoveredFields, FileContract, FileContractRevision, Segment, SiacoinInput, SiacoinOutput,
    SiafundInput, SiafundOutput, StorageProof, Transaction, TransactionBuilder, TransactionError,
    TransactionSignature,
};
pub use unlock::{derive_address, AddressDescription, UnlockConditions, UnlockError, UnlockHash};
pub use validation::{standalone_valid, ValidationError};
