//! Standalone transaction validity
//!
//! Context-free checks the ledger applies to every transaction: size,
//! structural rules, minimum values, contract windows, arbitrary data,
//! timelocks and signatures. Nothing here needs the chain state beyond a
//! block height.
//!
//! Rules run in a fixed order and the first failure is reported, so a
//! transaction that is only missing signatures yields
//! [`ValidationError::MissingSignatures`] and nothing else.

use super::currency::Currency;
use super::encoding::SiaEncode;
use super::params::{ProtocolParams, SIAFUND_COUNT, TRANSACTION_SIZE_OVERHEAD};
use super::subsidy::{ArbitraryData, SubsidyRekeyUpdate};
use super::transaction::{SiacoinOutput, Transaction, TransactionError};
use crate::crypto::{verify_hash, Hash256, PublicKey, SIGNATURE_ED25519, SIGNATURE_ENTROPY};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Reasons a transaction is not standalone-valid
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction is too large to fit in a block")]
    TransactionTooLarge,
    #[error("transaction contains storage proofs and outputs")]
    StorageProofWithOutputs,
    #[error("transaction spends an output twice")]
    DoubleSpend,
    #[error("transaction cannot have an output or payout that has zero value")]
    ZeroOutput,
    #[error("transaction has a zero value miner fee")]
    ZeroMinerFee,
    #[error("file contract window must start in the future")]
    FileContractWindowStartViolation,
    #[error("file contract window must end at least one block after it starts")]
    FileContractWindowEndViolation,
    #[error("file contract output sum does not match the payout")]
    FileContractOutputSumViolation,
    #[error("file contract revision has altered payout volume")]
    AlteredRevisionPayouts,
    #[error("transaction contains an improperly-encoded subsidy address update")]
    InvalidFoundationUpdateEncoding,
    #[error("timelock has not been met")]
    TimelockNotSatisfied,
    #[error("covered fields violates whole transaction")]
    WholeTransactionViolation,
    #[error("covered fields has a violation of sorted or unique indices")]
    SortedUniqueViolation,
    #[error("transaction has a frivolous signature")]
    FrivolousSignature,
    #[error("public key was used multiple times while signing transaction")]
    PublicKeyOveruse,
    #[error("transaction contains a signature that points to a nonexistent public key")]
    InvalidPubKeyIndex,
    #[error("timelock on signature has not expired")]
    PrematureSignature,
    #[error("transaction tries to sign an entropy public key")]
    EntropyKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("transaction is missing signatures")]
    MissingSignatures,
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl ValidationError {
    /// Whether the only problem is absent signatures
    pub fn is_missing_signatures(&self) -> bool {
        matches!(self, ValidationError::MissingSignatures)
    }
}

/// Check a transaction against every standalone rule at `height`
pub fn standalone_valid(
    txn: &Transaction,
    height: u64,
    params: &ProtocolParams,
) -> Result<(), ValidationError> {
    fits_in_a_block(txn, params)?;
    follows_storage_proof_rules(txn)?;
    no_repeats(txn)?;
    follows_minimum_values(txn)?;
    correct_file_contracts(txn, height)?;
    correct_file_contract_revisions(txn, height)?;
    correct_arbitrary_data(txn, height, params)?;
    valid_unlock_conditions(txn, height)?;
    valid_signatures(txn, height, params)
}

// =============================================================================
// Structural Rules
// =============================================================================

fn fits_in_a_block(txn: &Transaction, params: &ProtocolParams) -> Result<(), ValidationError> {
    let limit = params.block_size_limit.saturating_sub(TRANSACTION_SIZE_OVERHEAD);
    if txn.to_bytes().len() > limit {
        return Err(ValidationError::TransactionTooLarge);
    }
    Ok(())
}

fn follows_storage_proof_rules(txn: &Transaction) -> Result<(), ValidationError> {
    if txn.storage_proofs.is_empty() {
        return Ok(());
    }
    if !txn.siacoin_outputs.is_empty()
        || !txn.file_contracts.is_empty()
        || !txn.file_contract_revisions.is_empty()
        || !txn.siafund_outputs.is_empty()
    {
        return Err(ValidationError::StorageProofWithOutputs);
    }
    Ok(())
}

fn no_repeats(txn: &Transaction) -> Result<(), ValidationError> {
    let spent = txn
        .siacoin_inputs
        .iter()
        .map(|i| i.parent_id)
        .chain(txn.storage_proofs.iter().map(|sp| sp.parent_id))
        .chain(txn.file_contract_revisions.iter().map(|r| r.parent_id))
        .chain(txn.siafund_inputs.iter().map(|i| i.parent_id));

    let mut seen = HashSet::new();
    for id in spent {
        if !seen.insert(id) {
            return Err(ValidationError::DoubleSpend);
        }
    }
    Ok(())
}

fn follows_minimum_values(txn: &Transaction) -> Result<(), ValidationError> {
    let zero_output = txn.siacoin_outputs.iter().any(|o| o.value.is_zero())
        || txn.file_contracts.iter().any(|fc| fc.payout.is_zero())
        || txn.siafund_outputs.iter().any(|o| o.value.is_zero());
    if zero_output {
        return Err(ValidationError::ZeroOutput);
    }
    if txn.miner_fees.iter().any(Currency::is_zero) {
        return Err(ValidationError::ZeroMinerFee);
    }
    Ok(())
}

// =============================================================================
// Contracts and Data
// =============================================================================

/// Siafund tax on a contract payout, rounded down to a multiple of the
/// siafund count
pub fn contract_tax(payout: Currency) -> Currency {
    let tax = payout.0 / 1000 * 39 + payout.0 % 1000 * 39 / 1000;
    Currency(tax - tax % SIAFUND_COUNT)
}

fn output_sum(outputs: &[SiacoinOutput]) -> Option<Currency> {
    outputs
        .iter()
        .try_fold(Currency::ZERO, |acc, o| acc.checked_add(o.value))
}

fn correct_file_contracts(txn: &Transaction, height: u64) -> Result<(), ValidationError> {
    for fc in &txn.file_contracts {
        if fc.window_start <= height {
            return Err(ValidationError::FileContractWindowStartViolation);
        }
        if fc.window_end <= fc.window_start {
            return Err(ValidationError::FileContractWindowEndViolation);
        }
        let post_tax = fc.payout.checked_sub(contract_tax(fc.payout));
        if output_sum(&fc.valid_proof_outputs) != post_tax
            || output_sum(&fc.missed_proof_outputs) != post_tax
        {
            return Err(ValidationError::FileContractOutputSumViolation);
        }
    }
    Ok(())
}

fn correct_file_contract_revisions(txn: &Transaction, height: u64) -> Result<(), ValidationError> {
    for rev in &txn.file_contract_revisions {
        if rev.new_window_start <= height {
            return Err(ValidationError::FileContractWindowStartViolation);
        }
        if rev.new_window_end <= rev.new_window_start {
            return Err(ValidationError::FileContractWindowEndViolation);
        }
        if output_sum(&rev.new_valid_proof_outputs) != output_sum(&rev.new_missed_proof_outputs) {
            return Err(ValidationError::AlteredRevisionPayouts);
        }
    }
    Ok(())
}

fn correct_arbitrary_data(
    txn: &Transaction,
    height: u64,
    params: &ProtocolParams,
) -> Result<(), ValidationError> {
    if height < params.foundation_hardfork_height {
        return Ok(());
    }
    for data in &txn.arbitrary_data {
        if let ArbitraryData::MalformedUpdate(_) = SubsidyRekeyUpdate::classify(data) {
            return Err(ValidationError::InvalidFoundationUpdateEncoding);
        }
    }
    Ok(())
}

fn valid_unlock_conditions(txn: &Transaction, height: u64) -> Result<(), ValidationError> {
    let timelocks = txn
        .siacoin_inputs
        .iter()
        .map(|i| i.unlock_conditions.timelock)
        .chain(txn.file_contract_revisions.iter().map(|r| r.unlock_conditions.timelock))
        .chain(txn.siafund_inputs.iter().map(|i| i.unlock_conditions.timelock));

    for timelock in timelocks {
        if timelock > height {
            return Err(ValidationError::TimelockNotSatisfied);
        }
    }
    Ok(())
}

// =============================================================================
// Signatures
// =============================================================================

fn sorted_unique(indices: &[u64], len: usize) -> bool {
    let len = len as u64;
    let in_range = indices.iter().all(|&i| i < len);
    in_range && indices.windows(2).all(|w| w[0] < w[1])
}

fn valid_covered_fields(txn: &Transaction) -> Result<(), ValidationError> {
    for sig in &txn.transaction_signatures {
        let cf = &sig.covered_fields;
        if cf.whole_transaction {
            let partial = !cf.siacoin_inputs.is_empty()
                || !cf.siacoin_outputs.is_empty()
                || !cf.file_contracts.is_empty()
                || !cf.file_contract_revisions.is_empty()
                || !cf.storage_proofs.is_empty()
                || !cf.siafund_inputs.is_empty()
                || !cf.siafund_outputs.is_empty()
                || !cf.miner_fees.is_empty()
                || !cf.arbitrary_data.is_empty();
            if partial {
                return Err(ValidationError::WholeTransactionViolation);
            }
        }

        let fields: [(&[u64], usize); 10] = [
            (cf.siacoin_inputs.as_slice(), txn.siacoin_inputs.len()),
            (cf.siacoin_outputs.as_slice(), txn.siacoin_outputs.len()),
            (cf.file_contracts.as_slice(), txn.file_contracts.len()),
            (cf.file_contract_revisions.as_slice(), txn.file_contract_revisions.len()),
            (cf.storage_proofs.as_slice(), txn.storage_proofs.len()),
            (cf.siafund_inputs.as_slice(), txn.siafund_inputs.len()),
            (cf.siafund_outputs.as_slice(), txn.siafund_outputs.len()),
            (cf.miner_fees.as_slice(), txn.miner_fees.len()),
            (cf.arbitrary_data.as_slice(), txn.arbitrary_data.len()),
            (cf.transaction_signatures.as_slice(), txn.transaction_signatures.len()),
        ];
        if !fields.iter().all(|(indices, len)| sorted_unique(indices, *len)) {
            return Err(ValidationError::SortedUniqueViolation);
        }
    }
    Ok(())
}

/// Signature bookkeeping for one spent element
struct InputSignatures<'a> {
    remaining: u64,
    possible_keys: &'a [PublicKey],
    used_keys: HashSet<u64>,
}

fn valid_signatures(
    txn: &Transaction,
    height: u64,
    params: &ProtocolParams,
) -> Result<(), ValidationError> {
    valid_covered_fields(txn)?;

    let spends = txn
        .siacoin_inputs
        .iter()
        .map(|i| (i.parent_id, &i.unlock_conditions))
        .chain(
            txn.file_contract_revisions
                .iter()
                .map(|r| (r.parent_id, &r.unlock_conditions)),
        )
        .chain(txn.siafund_inputs.iter().map(|i| (i.parent_id, &i.unlock_conditions)));

    let mut sig_map: HashMap<Hash256, InputSignatures<'_>> = HashMap::new();
    for (id, uc) in spends {
        let entry = InputSignatures {
            remaining: uc.signatures_required,
            possible_keys: &uc.public_keys,
            used_keys: HashSet::new(),
        };
        if sig_map.insert(id, entry).is_some() {
            return Err(ValidationError::DoubleSpend);
        }
    }

    for (i, sig) in txn.transaction_signatures.iter().enumerate() {
        let entry = match sig_map.get_mut(&sig.parent_id) {
            Some(entry) if entry.remaining > 0 => entry,
            _ => return Err(ValidationError::FrivolousSignature),
        };
        if entry.used_keys.contains(&sig.public_key_index) {
            return Err(ValidationError::PublicKeyOveruse);
        }
        let public_key = usize::try_from(sig.public_key_index)
            .ok()
            .and_then(|idx| entry.possible_keys.get(idx))
            .ok_or(ValidationError::InvalidPubKeyIndex)?;
        if sig.timelock > height {
            return Err(ValidationError::PrematureSignature);
        }

        if public_key.algorithm == SIGNATURE_ENTROPY {
            return Err(ValidationError::EntropyKey);
        }
        if public_key.algorithm == SIGNATURE_ED25519 {
            let sig_hash = txn.sig_hash(i, height, params)?;
            if !verify_hash(public_key, &sig_hash, &sig.signature) {
                return Err(ValidationError::InvalidSignature);
            }
        }
        // keys of unknown algorithms are accepted as signed

        entry.used_keys.insert(sig.public_key_index);
        entry.remaining -= 1;
    }

    if sig_map.values().any(|entry| entry.remaining > 0) {
        return Err(ValidationError::MissingSignatures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{
        CoveredFields, FileContract, Segment, StorageProof, TransactionBuilder,
        TransactionSignature,
    };
    use crate::core::unlock::{UnlockConditions, UnlockHash};
    use crate::crypto::{blake2b, KeyPair, Seed, Specifier};

    const HEIGHT: u64 = 298_001;

    fn params() -> ProtocolParams {
        ProtocolParams::default()
    }

    fn seed() -> Seed {
        Seed::from_entropy([7u8; 16])
    }

    fn multisig(m: u64) -> UnlockConditions {
        UnlockConditions::new(0, m, vec![seed().public_key(0), seed().public_key(1)]).unwrap()
    }

    fn unsigned(uc: UnlockConditions) -> Transaction {
        let dest = uc.unlock_hash();
        TransactionBuilder::new()
            .add_input(blake2b(b"subsidy"), uc, Currency::siacoins(100))
            .unwrap()
            .add_output(dest, Currency::siacoins(95))
            .unwrap()
            .build()
    }

    fn add_signature(txn: &mut Transaction, key_index: u64, key: &KeyPair) {
        txn.transaction_signatures.push(TransactionSignature {
            parent_id: txn.siacoin_inputs[0].parent_id,
            public_key_index: key_index,
            timelock: 0,
            covered_fields: CoveredFields::whole_transaction(),
            signature: Vec::new(),
        });
        let last = txn.transaction_signatures.len() - 1;
        let hash = txn.sig_hash(last, HEIGHT, &params()).unwrap();
        txn.transaction_signatures[last].signature = key.sign_hash(&hash).to_vec();
    }

    fn check(txn: &Transaction) -> Result<(), ValidationError> {
        standalone_valid(txn, HEIGHT, &params())
    }

    #[test]
    fn test_missing_signatures() {
        let mut txn = unsigned(multisig(2));
        assert_eq!(check(&txn), Err(ValidationError::MissingSignatures));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        let err = check(&txn).unwrap_err();
        assert!(err.is_missing_signatures());
    }

    #[test]
    fn test_fully_signed() {
        let mut txn = unsigned(multisig(2));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        add_signature(&mut txn, 1, &seed().key_pair(1));
        assert_eq!(check(&txn), Ok(()));
    }

    #[test]
    fn test_signature_for_other_height_is_invalid() {
        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        let before_hardfork = params().asic_hardfork_height + 1;
        assert_eq!(
            standalone_valid(&txn, before_hardfork, &params()),
            Err(ValidationError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_key_is_invalid() {
        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 0, &seed().key_pair(1));
        assert_eq!(check(&txn), Err(ValidationError::InvalidSignature));
    }

    #[test]
    fn test_frivolous_and_overuse() {
        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        add_signature(&mut txn, 1, &seed().key_pair(1));
        assert_eq!(check(&txn), Err(ValidationError::FrivolousSignature));

        let mut txn = unsigned(multisig(2));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        assert_eq!(check(&txn), Err(ValidationError::PublicKeyOveruse));

        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        txn.transaction_signatures[0].parent_id = blake2b(b"elsewhere");
        assert_eq!(check(&txn), Err(ValidationError::FrivolousSignature));
    }

    #[test]
    fn test_key_index_out_of_range() {
        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 5, &seed().key_pair(0));
        assert_eq!(check(&txn), Err(ValidationError::InvalidPubKeyIndex));
    }

    #[test]
    fn test_premature_signature() {
        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        txn.transaction_signatures[0].timelock = HEIGHT + 1;
        assert_eq!(check(&txn), Err(ValidationError::PrematureSignature));
    }

    #[test]
    fn test_key_algorithms() {
        let mut entropy = multisig(1);
        entropy.public_keys[0].algorithm = SIGNATURE_ENTROPY;
        let mut txn = unsigned(entropy);
        add_signature(&mut txn, 0, &seed().key_pair(0));
        assert_eq!(check(&txn), Err(ValidationError::EntropyKey));

        let mut unknown = multisig(1);
        unknown.public_keys[0].algorithm = Specifier::new("future");
        let mut txn = unsigned(unknown);
        add_signature(&mut txn, 0, &seed().key_pair(0));
        txn.transaction_signatures[0].signature = vec![0; 3];
        assert_eq!(check(&txn), Ok(()));
    }

    #[test]
    fn test_covered_fields_rules() {
        let mut txn = unsigned(multisig(1));
        add_signature(&mut txn, 0, &seed().key_pair(0));
        txn.transaction_signatures[0].covered_fields.siacoin_outputs = vec![0];
        assert_eq!(check(&txn), Err(ValidationError::WholeTransactionViolation));

        txn.transaction_signatures[0].covered_fields = CoveredFields {
            siacoin_outputs: vec![0, 0],
            ..Default::default()
        };
        assert_eq!(check(&txn), Err(ValidationError::SortedUniqueViolation));

        txn.transaction_signatures[0].covered_fields = CoveredFields {
            miner_fees: vec![1],
            ..Default::default()
        };
        assert_eq!(check(&txn), Err(ValidationError::SortedUniqueViolation));
    }

    #[test]
    fn test_timelock() {
        let mut uc = multisig(1);
        uc.timelock = HEIGHT + 10;
        let txn = unsigned(uc);
        assert_eq!(check(&txn), Err(ValidationError::TimelockNotSatisfied));
    }

    #[test]
    fn test_double_spend() {
        let mut txn = unsigned(multisig(1));
        let input = txn.siacoin_inputs[0].clone();
        txn.siacoin_inputs.push(input);
        assert_eq!(check(&txn), Err(ValidationError::DoubleSpend));
    }

    #[test]
    fn test_minimum_values() {
        let mut txn = unsigned(multisig(1));
        txn.siacoin_outputs[0].value = Currency::ZERO;
        assert_eq!(check(&txn), Err(ValidationError::ZeroOutput));

        let mut txn = unsigned(multisig(1));
        txn.miner_fees.push(Currency::ZERO);
        assert_eq!(check(&txn), Err(ValidationError::ZeroMinerFee));
    }

    #[test]
    fn test_malformed_update() {
        let mut txn = unsigned(multisig(1));
        txn.arbitrary_data.push(b"foundation\0\0\0\0\0\0short".to_vec());
        assert_eq!(
            check(&txn),
            Err(ValidationError::InvalidFoundationUpdateEncoding)
        );
        // not enforced before the hardfork
        let before = params().foundation_hardfork_height - 1;
        assert_ne!(
            standalone_valid(&txn, before, &params()),
            Err(ValidationError::InvalidFoundationUpdateEncoding)
        );
    }

    #[test]
    fn test_storage_proof_rules() {
        let mut txn = unsigned(multisig(1));
        txn.storage_proofs.push(StorageProof {
            parent_id: blake2b(b"contract"),
            segment: Segment::default(),
            hash_set: Vec::new(),
        });
        assert_eq!(check(&txn), Err(ValidationError::StorageProofWithOutputs));
    }

    fn contract(payout: Currency, window_start: u64) -> FileContract {
        let post_tax = payout.checked_sub(contract_tax(payout)).unwrap();
        let output = SiacoinOutput {
            value: post_tax,
            unlock_hash: UnlockHash::default(),
        };
        FileContract {
            file_size: 0,
            file_merkle_root: Hash256::zero(),
            window_start,
            window_end: window_start + 10,
            payout,
            valid_proof_outputs: vec![output.clone()],
            missed_proof_outputs: vec![output],
            unlock_hash: UnlockHash::default(),
            revision_number: 0,
        }
    }

    #[test]
    fn test_contract_tax() {
        assert_eq!(contract_tax(Currency::siacoins(1000)), Currency::siacoins(39));
        assert_eq!(contract_tax(Currency::new(1_000_000)), Currency::new(30_000));
        assert_eq!(contract_tax(Currency::new(100)), Currency::ZERO);
    }

    #[test]
    fn test_file_contract_rules() {
        let mut txn = unsigned(multisig(1));
        txn.file_contracts.push(contract(Currency::siacoins(10), HEIGHT + 5));
        assert_eq!(check(&txn), Err(ValidationError::MissingSignatures));

        txn.file_contracts[0].window_start = HEIGHT;
        assert_eq!(
            check(&txn),
            Err(ValidationError::FileContractWindowStartViolation)
        );

        txn.file_contracts[0] = contract(Currency::siacoins(10), HEIGHT + 5);
        txn.file_contracts[0].window_end = HEIGHT + 5;
        assert_eq!(
            check(&txn),
            Err(ValidationError::FileContractWindowEndViolation)
        );

        txn.file_contracts[0] = contract(Currency::siacoins(10), HEIGHT + 5);
        txn.file_contracts[0].valid_proof_outputs[0].value = Currency::siacoins(10);
        assert_eq!(
            check(&txn),
            Err(ValidationError::FileContractOutputSumViolation)
        );
    }

    #[test]
    fn test_too_large() {
        let mut txn = unsigned(multisig(1));
        txn.arbitrary_data.push(vec![0u8; 2_000_000]);
        assert_eq!(check(&txn), Err(ValidationError::TransactionTooLarge));
    }
}
