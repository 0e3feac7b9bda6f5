//! Incremental co-signing
//!
//! Each participant holds a seed. Signing derives the seed's first keys,
//! finds the first input slot one of them may fill, and appends exactly one
//! whole-transaction signature. Running it again with the same seed never
//! duplicates a slot, so the transaction file can be passed around and
//! signed in any order.

use crate::core::{
    standalone_valid, CoveredFields, ProtocolParams, Transaction, TransactionError,
    TransactionSignature, ValidationError,
};
use crate::crypto::{Hash256, KeyPair, PublicKey, Seed};
use std::collections::HashMap;
use thiserror::Error;

/// Number of seed keys searched by default
pub const DEFAULT_KEY_SEARCH_LIMIT: u64 = 10_000;

/// Errors related to multisig signing
#[derive(Error, Debug)]
pub enum MultisigError {
    #[error("Transaction is invalid: {0}")]
    InvalidTransaction(ValidationError),
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
}

/// Signer configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerConfig {
    /// How many seed indices to derive when looking for a matching key
    pub key_search_limit: u64,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            key_search_limit: DEFAULT_KEY_SEARCH_LIMIT,
        }
    }
}

impl SignerConfig {
    pub fn with_key_search_limit(key_search_limit: u64) -> Self {
        Self { key_search_limit }
    }
}

// =============================================================================
// Key Index
// =============================================================================

/// Keys derived from a seed, looked up by public key bytes
pub struct KeyIndex {
    keys: HashMap<Vec<u8>, (u64, KeyPair)>,
}

impl KeyIndex {
    /// Derive keys `0..limit` from `seed`
    pub fn derive(seed: &Seed, limit: u64) -> Self {
        log::debug!("Deriving {} keys from seed", limit);
        let keys = (0..limit)
            .map(|index| {
                let key = seed.key_pair(index);
                (key.public_key_bytes().to_vec(), (index, key))
            })
            .collect();
        Self { keys }
    }

    /// Find the derived key matching an ed25519 public key
    pub fn find(&self, public_key: &PublicKey) -> Option<&(u64, KeyPair)> {
        if !public_key.is_ed25519() {
            return None;
        }
        self.keys.get(&public_key.key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// =============================================================================
// Co-signing
// =============================================================================

/// A signature slot filled by [`cosign`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedSlot {
    /// Position of the input in the transaction
    pub input_index: usize,
    pub parent_id: Hash256,
    /// Position of the key in the input's unlock conditions
    pub public_key_index: u64,
    /// Seed index the key was derived from
    pub seed_index: u64,
}

/// Add one signature from `seed`, if it can fill any open slot
///
/// Returns `Ok(None)` when the seed has nothing to contribute.
pub fn cosign(
    txn: &mut Transaction,
    seed: &Seed,
    config: &SignerConfig,
    params: &ProtocolParams,
) -> Result<Option<SignedSlot>, MultisigError> {
    let keys = KeyIndex::derive(seed, config.key_search_limit);
    cosign_with_keys(txn, &keys, params)
}

/// Add one signature using an already derived key index
pub fn cosign_with_keys(
    txn: &mut Transaction,
    keys: &KeyIndex,
    params: &ProtocolParams,
) -> Result<Option<SignedSlot>, MultisigError> {
    let Some((slot, key)) = find_open_slot(txn, keys) else {
        log::debug!("No open signature slot matches the seed");
        return Ok(None);
    };

    txn.transaction_signatures.push(TransactionSignature {
        parent_id: slot.parent_id,
        public_key_index: slot.public_key_index,
        timelock: 0,
        covered_fields: CoveredFields::whole_transaction(),
        signature: Vec::new(),
    });
    let index = txn.transaction_signatures.len() - 1;
    let sig_hash = match txn.sig_hash(index, params.sign_height, params) {
        Ok(hash) => hash,
        Err(e) => {
            txn.transaction_signatures.pop();
            return Err(e.into());
        }
    };
    txn.transaction_signatures[index].signature = key.sign_hash(&sig_hash).to_vec();

    log::info!(
        "Signed input {} with key {} (seed index {})",
        slot.parent_id,
        slot.public_key_index,
        slot.seed_index
    );
    Ok(Some(slot))
}

fn find_open_slot<'k>(
    txn: &Transaction,
    keys: &'k KeyIndex,
) -> Option<(SignedSlot, &'k KeyPair)> {
    for (input_index, input) in txn.siacoin_inputs.iter().enumerate() {
        let uc = &input.unlock_conditions;
        let existing = txn.signature_count_for(&input.parent_id) as u64;
        if existing >= uc.signatures_required {
            continue;
        }
        for (public_key_index, public_key) in uc.public_keys.iter().enumerate() {
            let Some((seed_index, key)) = keys.find(public_key) else {
                continue;
            };
            let public_key_index = public_key_index as u64;
            if txn.has_signature_for(&input.parent_id, public_key_index) {
                continue;
            }
            let slot = SignedSlot {
                input_index,
                parent_id: input.parent_id,
                public_key_index,
                seed_index: *seed_index,
            };
            return Some((slot, key));
        }
    }
    None
}

// =============================================================================
// Signing Workflow
// =============================================================================

/// Result of one participant's signing turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    /// Nothing was missing before signing
    AlreadyComplete,
    /// One signature was added
    Added { slot: SignedSlot, complete: bool },
    /// The seed holds none of the missing keys
    NothingToContribute,
}

/// Check the transaction, then co-sign it once
///
/// Refuses to touch a transaction that is invalid for any reason other
/// than missing signatures.
pub fn sign_transaction(
    txn: &mut Transaction,
    seed: &Seed,
    config: &SignerConfig,
    params: &ProtocolParams,
) -> Result<SignOutcome, MultisigError> {
    match standalone_valid(txn, params.sign_height, params) {
        Ok(()) => return Ok(SignOutcome::AlreadyComplete),
        Err(e) if e.is_missing_signatures() => {}
        Err(e) => return Err(MultisigError::InvalidTransaction(e)),
    }

    match cosign(txn, seed, config, params)? {
        None => Ok(SignOutcome::NothingToContribute),
        Some(slot) => {
            let complete = standalone_valid(txn, params.sign_height, params).is_ok();
            Ok(SignOutcome::Added { slot, complete })
        }
    }
}
