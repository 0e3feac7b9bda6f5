//! Transaction handling for the ledger
//!
//! Implements the ledger's transaction model:
//! - Siacoin and siafund inputs/outputs
//! - File contracts, revisions and storage proofs (carried for exact
//!   encoding; this tool never creates them)
//! - Miner fees and arbitrary data
//! - Signatures with covered fields
//!
//! The binary encoding and the signature digest must match the ledger byte
//! for byte, otherwise IDs and signatures will not verify on the network.

use super::currency::Currency;
use super::encoding::{Encoder, SiaEncode};
use super::json::{base64_bytes, base64_list, nullable_vec};
use super::params::ProtocolParams;
use super::subsidy::SubsidyRekeyUpdate;
use super::unlock::{UnlockConditions, UnlockHash};
use crate::crypto::{Hash256, OutputId, TransactionId};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransactionError {
    #[error("No signature at index {0}")]
    SignatureNotFound(usize),
    #[error("Covered fields reference {field} element {index}, which does not exist")]
    CoveredFieldOutOfRange { field: &'static str, index: u64 },
    #[error("Outputs ({outputs}) exceed inputs ({inputs})")]
    OutputsExceedInputs { inputs: Currency, outputs: Currency },
    #[error("Amount overflows")]
    AmountOverflow,
}

// =============================================================================
// Inputs and Outputs
// =============================================================================

/// Siacoin input (reference to a previous output plus its spend policy)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiacoinInput {
    #[serde(rename = "parentid")]
    pub parent_id: OutputId,
    #[serde(rename = "unlockconditions")]
    pub unlock_conditions: UnlockConditions,
}

/// Siacoin output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiacoinOutput {
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
}

/// Siafund input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiafundInput {
    #[serde(rename = "parentid")]
    pub parent_id: OutputId,
    #[serde(rename = "unlockconditions")]
    pub unlock_conditions: UnlockConditions,
    #[serde(rename = "claimunlockhash")]
    pub claim_unlock_hash: UnlockHash,
}

/// Siafund output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiafundOutput {
    pub value: Currency,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
    #[serde(rename = "claimstart")]
    pub claim_start: Currency,
}

// =============================================================================
// Storage Contracts
// =============================================================================

/// File contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContract {
    #[serde(rename = "filesize")]
    pub file_size: u64,
    #[serde(rename = "filemerkleroot")]
    pub file_merkle_root: Hash256,
    #[serde(rename = "windowstart")]
    pub window_start: u64,
    #[serde(rename = "windowend")]
    pub window_end: u64,
    pub payout: Currency,
    #[serde(rename = "validproofoutputs", default, deserialize_with = "nullable_vec")]
    pub valid_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "missedproofoutputs", default, deserialize_with = "nullable_vec")]
    pub missed_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "unlockhash")]
    pub unlock_hash: UnlockHash,
    #[serde(rename = "revisionnumber")]
    pub revision_number: u64,
}

/// File contract revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContractRevision {
    #[serde(rename = "parentid")]
    pub parent_id: OutputId,
    #[serde(rename = "unlockconditions")]
    pub unlock_conditions: UnlockConditions,
    #[serde(rename = "newrevisionnumber")]
    pub new_revision_number: u64,
    #[serde(rename = "newfilesize")]
    pub new_file_size: u64,
    #[serde(rename = "newfilemerkleroot")]
    pub new_file_merkle_root: Hash256,
    #[serde(rename = "newwindowstart")]
    pub new_window_start: u64,
    #[serde(rename = "newwindowend")]
    pub new_window_end: u64,
    #[serde(rename = "newvalidproofoutputs", default, deserialize_with = "nullable_vec")]
    pub new_valid_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "newmissedproofoutputs", default, deserialize_with = "nullable_vec")]
    pub new_missed_proof_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "newunlockhash")]
    pub new_unlock_hash: UnlockHash,
}

/// Size of a storage proof segment
pub const SEGMENT_SIZE: usize = 64;

/// A storage proof segment, encoded in JSON as an array of byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment(pub [u8; SEGMENT_SIZE]);

impl Default for Segment {
    fn default() -> Self {
        Self([0u8; SEGMENT_SIZE])
    }
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let array: [u8; SEGMENT_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            de::Error::invalid_length(bytes.len(), &"a 64-byte storage proof segment")
        })?;
        Ok(Segment(array))
    }
}

/// Storage proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    #[serde(rename = "parentid")]
    pub parent_id: OutputId,
    pub segment: Segment,
    #[serde(rename = "hashset", default, deserialize_with = "nullable_vec")]
    pub hash_set: Vec<Hash256>,
}

// =============================================================================
// Signatures
// =============================================================================

/// Which parts of a transaction a signature commits to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveredFields {
    #[serde(rename = "wholetransaction")]
    pub whole_transaction: bool,
    #[serde(rename = "siacoininputs", default, deserialize_with = "nullable_vec")]
    pub siacoin_inputs: Vec<u64>,
    #[serde(rename = "siacoinoutputs", default, deserialize_with = "nullable_vec")]
    pub siacoin_outputs: Vec<u64>,
    #[serde(rename = "filecontracts", default, deserialize_with = "nullable_vec")]
    pub file_contracts: Vec<u64>,
    #[serde(rename = "filecontractrevisions", default, deserialize_with = "nullable_vec")]
    pub file_contract_revisions: Vec<u64>,
    #[serde(rename = "storageproofs", default, deserialize_with = "nullable_vec")]
    pub storage_proofs: Vec<u64>,
    #[serde(rename = "siafundinputs", default, deserialize_with = "nullable_vec")]
    pub siafund_inputs: Vec<u64>,
    #[serde(rename = "siafundoutputs", default, deserialize_with = "nullable_vec")]
    pub siafund_outputs: Vec<u64>,
    #[serde(rename = "minerfees", default, deserialize_with = "nullable_vec")]
    pub miner_fees: Vec<u64>,
    #[serde(rename = "arbitrarydata", default, deserialize_with = "nullable_vec")]
    pub arbitrary_data: Vec<u64>,
    #[serde(rename = "transactionsignatures", default, deserialize_with = "nullable_vec")]
    pub transaction_signatures: Vec<u64>,
}

impl CoveredFields {
    /// Cover the whole transaction
    pub fn whole_transaction() -> Self {
        Self {
            whole_transaction: true,
            ..Default::default()
        }
    }
}

/// A signature over (part of) a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    /// ID of the input, revision or siafund input this signature spends
    #[serde(rename = "parentid")]
    pub parent_id: Hash256,
    /// Which key of the parent's unlock conditions signed
    #[serde(rename = "publickeyindex")]
    pub public_key_index: u64,
    #[serde(default)]
    pub timelock: u64,
    #[serde(rename = "coveredfields")]
    pub covered_fields: CoveredFields,
    #[serde(with = "base64_bytes", default)]
    pub signature: Vec<u8>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A ledger transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "siacoininputs", default, deserialize_with = "nullable_vec")]
    pub siacoin_inputs: Vec<SiacoinInput>,
    #[serde(rename = "siacoinoutputs", default, deserialize_with = "nullable_vec")]
    pub siacoin_outputs: Vec<SiacoinOutput>,
    #[serde(rename = "filecontracts", default, deserialize_with = "nullable_vec")]
    pub file_contracts: Vec<FileContract>,
    #[serde(rename = "filecontractrevisions", default, deserialize_with = "nullable_vec")]
    pub file_contract_revisions: Vec<FileContractRevision>,
    #[serde(rename = "storageproofs", default, deserialize_with = "nullable_vec")]
    pub storage_proofs: Vec<StorageProof>,
    #[serde(rename = "siafundinputs", default, deserialize_with = "nullable_vec")]
    pub siafund_inputs: Vec<SiafundInput>,
    #[serde(rename = "siafundoutputs", default, deserialize_with = "nullable_vec")]
    pub siafund_outputs: Vec<SiafundOutput>,
    #[serde(rename = "minerfees", default, deserialize_with = "nullable_vec")]
    pub miner_fees: Vec<Currency>,
    #[serde(rename = "arbitrarydata", with = "base64_list", default)]
    pub arbitrary_data: Vec<Vec<u8>>,
    #[serde(rename = "transactionsignatures", default, deserialize_with = "nullable_vec")]
    pub transaction_signatures: Vec<TransactionSignature>,
}

impl Transaction {
    /// Transaction ID: the hash of the transaction without its signatures
    pub fn id(&self) -> TransactionId {
        let mut e = Encoder::new();
        self.encode_without_signatures(&mut e);
        e.hash()
    }

    /// Encode every field except the signatures
    pub fn encode_without_signatures(&self, e: &mut Encoder) {
        e.encode(&self.siacoin_inputs);
        e.encode(&self.siacoin_outputs);
        e.encode(&self.file_contracts);
        e.encode(&self.file_contract_revisions);
        e.encode(&self.storage_proofs);
        e.encode(&self.siafund_inputs);
        e.encode(&self.siafund_outputs);
        e.encode(&self.miner_fees);
        e.write_len(self.arbitrary_data.len());
        for arb in &self.arbitrary_data {
            e.write_prefixed(arb);
        }
    }

    /// Sum of all miner fees
    pub fn total_miner_fees(&self) -> Currency {
        self.miner_fees.iter().copied().sum()
    }

    /// Whether any signature already claims `(parent_id, public_key_index)`
    pub fn has_signature_for(&self, parent_id: &Hash256, public_key_index: u64) -> bool {
        self.transaction_signatures
            .iter()
            .any(|sig| sig.parent_id == *parent_id && sig.public_key_index == public_key_index)
    }

    /// Number of signatures attached for a parent ID
    pub fn signature_count_for(&self, parent_id: &Hash256) -> usize {
        self.transaction_signatures
            .iter()
            .filter(|sig| sig.parent_id == *parent_id)
            .count()
    }

    // =========================================================================
    // Signature Digests
    // =========================================================================

    /// Digest that the signature at `index` commits to, at `height`
    pub fn sig_hash(
        &self,
        index: usize,
        height: u64,
        params: &ProtocolParams,
    ) -> Result<Hash256, TransactionError> {
        let sig = self
            .transaction_signatures
            .get(index)
            .ok_or(TransactionError::SignatureNotFound(index))?;
        let prefix = params.replay_prefix(height);
        if sig.covered_fields.whole_transaction {
            self.whole_sig_hash(sig, prefix)
        } else {
            self.partial_sig_hash(&sig.covered_fields, prefix)
        }
    }

    fn whole_sig_hash(
        &self,
        sig: &TransactionSignature,
        prefix: &[u8],
    ) -> Result<Hash256, TransactionError> {
        let mut e = Encoder::new();

        e.write_len(self.siacoin_inputs.len());
        for input in &self.siacoin_inputs {
            e.write_raw(prefix);
            e.encode(input);
        }
        e.encode(&self.siacoin_outputs);
        e.encode(&self.file_contracts);
        e.encode(&self.file_contract_revisions);
        e.encode(&self.storage_proofs);
        e.write_len(self.siafund_inputs.len());
        for input in &self.siafund_inputs {
            e.write_raw(prefix);
            e.encode(input);
        }
        e.encode(&self.siafund_outputs);
        e.encode(&self.miner_fees);
        e.write_len(self.arbitrary_data.len());
        for arb in &self.arbitrary_data {
            e.write_prefixed(arb);
        }

        e.encode(&sig.parent_id);
        e.write_u64(sig.public_key_index);
        e.write_u64(sig.timelock);

        for &i in &sig.covered_fields.transaction_signatures {
            e.encode(covered(&self.transaction_signatures, "transactionsignatures", i)?);
        }
        Ok(e.hash())
    }

    fn partial_sig_hash(
        &self,
        cf: &CoveredFields,
        prefix: &[u8],
    ) -> Result<Hash256, TransactionError> {
        let mut e = Encoder::new();

        for &i in &cf.siacoin_inputs {
            e.write_raw(prefix);
            e.encode(covered(&self.siacoin_inputs, "siacoininputs", i)?);
        }
        for &i in &cf.siacoin_outputs {
            e.encode(covered(&self.siacoin_outputs, "siacoinoutputs", i)?);
        }
        for &i in &cf.file_contracts {
            e.encode(covered(&self.file_contracts, "filecontracts", i)?);
        }
        for &i in &cf.file_contract_revisions {
            e.encode(covered(&self.file_contract_revisions, "filecontractrevisions", i)?);
        }
        for &i in &cf.storage_proofs {
            e.encode(covered(&self.storage_proofs, "storageproofs", i)?);
        }
        for &i in &cf.siafund_inputs {
            e.write_raw(prefix);
            e.encode(covered(&self.siafund_inputs, "siafundinputs", i)?);
        }
        for &i in &cf.siafund_outputs {
            e.encode(covered(&self.siafund_outputs, "siafundoutputs", i)?);
        }
        for &i in &cf.miner_fees {
            e.encode(covered(&self.miner_fees, "minerfees", i)?);
        }
        for &i in &cf.arbitrary_data {
            e.write_prefixed(covered(&self.arbitrary_data, "arbitrarydata", i)?);
        }
        for &i in &cf.transaction_signatures {
            e.encode(covered(&self.transaction_signatures, "transactionsignatures", i)?);
        }
        Ok(e.hash())
    }
}

fn covered<'a, T>(
    items: &'a [T],
    field: &'static str,
    index: u64,
) -> Result<&'a T, TransactionError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .ok_or(TransactionError::CoveredFieldOutOfRange { field, index })
}

// =============================================================================
// Binary Encoding
// =============================================================================

impl SiaEncode for SiacoinInput {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.parent_id);
        e.encode(&self.unlock_conditions);
    }
}

impl SiaEncode for SiacoinOutput {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.value);
        e.encode(&self.unlock_hash);
    }
}

impl SiaEncode for SiafundInput {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.parent_id);
        e.encode(&self.unlock_conditions);
        e.encode(&self.claim_unlock_hash);
    }
}

impl SiaEncode for SiafundOutput {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.value);
        e.encode(&self.unlock_hash);
        e.encode(&self.claim_start);
    }
}

impl SiaEncode for FileContract {
    fn encode(&self, e: &mut Encoder) {
        e.write_u64(self.file_size);
        e.encode(&self.file_merkle_root);
        e.write_u64(self.window_start);
        e.write_u64(self.window_end);
        e.encode(&self.payout);
        e.encode(&self.valid_proof_outputs);
        e.encode(&self.missed_proof_outputs);
        e.encode(&self.unlock_hash);
        e.write_u64(self.revision_number);
    }
}

impl SiaEncode for FileContractRevision {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.parent_id);
        e.encode(&self.unlock_conditions);
        e.write_u64(self.new_revision_number);
        e.write_u64(self.new_file_size);
        e.encode(&self.new_file_merkle_root);
        e.write_u64(self.new_window_start);
        e.write_u64(self.new_window_end);
        e.encode(&self.new_valid_proof_outputs);
        e.encode(&self.new_missed_proof_outputs);
        e.encode(&self.new_unlock_hash);
    }
}

impl SiaEncode for StorageProof {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.parent_id);
        e.write_raw(&self.segment.0);
        e.encode(&self.hash_set);
    }
}

impl SiaEncode for CoveredFields {
    fn encode(&self, e: &mut Encoder) {
        e.write_bool(self.whole_transaction);
        e.encode(&self.siacoin_inputs);
        e.encode(&self.siacoin_outputs);
        e.encode(&self.file_contracts);
        e.encode(&self.file_contract_revisions);
        e.encode(&self.storage_proofs);
        e.encode(&self.siafund_inputs);
        e.encode(&self.siafund_outputs);
        e.encode(&self.miner_fees);
        e.encode(&self.arbitrary_data);
        e.encode(&self.transaction_signatures);
    }
}

impl SiaEncode for TransactionSignature {
    fn encode(&self, e: &mut Encoder) {
        e.encode(&self.parent_id);
        e.write_u64(self.public_key_index);
        e.write_u64(self.timelock);
        e.encode(&self.covered_fields);
        e.write_prefixed(&self.signature);
    }
}

impl SiaEncode for Transaction {
    fn encode(&self, e: &mut Encoder) {
        self.encode_without_signatures(e);
        e.encode(&self.transaction_signatures);
    }
}

// =============================================================================
// Transaction Builder
// =============================================================================

/// Builder for unsigned subsidy-spending transactions
///
/// Tracks the value of every input so that the remainder after outputs can
/// be paid as a miner fee.
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    inputs: Vec<SiacoinInput>,
    input_sum: Currency,
    outputs: Vec<SiacoinOutput>,
    output_sum: Currency,
    arbitrary_data: Vec<Vec<u8>>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input spending `parent_id`, which holds `value`
    pub fn add_input(
        mut self,
        parent_id: OutputId,
        unlock_conditions: UnlockConditions,
        value: Currency,
    ) -> Result<Self, TransactionError> {
        self.input_sum = self
            .input_sum
            .checked_add(value)
            .ok_or(TransactionError::AmountOverflow)?;
        self.inputs.push(SiacoinInput {
            parent_id,
            unlock_conditions,
        });
        Ok(self)
    }

    /// Add an output; fails if outputs would exceed inputs
    pub fn add_output(
        mut self,
        unlock_hash: UnlockHash,
        value: Currency,
    ) -> Result<Self, TransactionError> {
        let output_sum = self
            .output_sum
            .checked_add(value)
            .ok_or(TransactionError::AmountOverflow)?;
        if output_sum > self.input_sum {
            return Err(TransactionError::OutputsExceedInputs {
                inputs: self.input_sum,
                outputs: output_sum,
            });
        }
        self.output_sum = output_sum;
        self.outputs.push(SiacoinOutput { value, unlock_hash });
        Ok(self)
    }

    /// Attach a subsidy address update
    pub fn with_update(mut self, update: &SubsidyRekeyUpdate) -> Self {
        self.arbitrary_data.push(update.to_arbitrary_data());
        self
    }

    /// Remaining input value, paid as miner fee
    pub fn fee(&self) -> Currency {
        // add_output keeps output_sum <= input_sum
        self.input_sum
            .checked_sub(self.output_sum)
            .unwrap_or(Currency::ZERO)
    }

    /// Build without signing
    pub fn build(self) -> Transaction {
        let fee = self.fee();
        Transaction {
            siacoin_inputs: self.inputs,
            siacoin_outputs: self.outputs,
            miner_fees: if fee.is_zero() { Vec::new() } else { vec![fee] },
            arbitrary_data: self.arbitrary_data,
            ..Default::default()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{blake2b, Seed};

    fn sample_address(n: u8) -> UnlockHash {
        UnlockConditions::standard(Seed::from_entropy([n; 16]).public_key(0)).unlock_hash()
    }

    fn sample_transaction() -> Transaction {
        let seed = Seed::from_entropy([1u8; 16]);
        TransactionBuilder::new()
            .add_input(
                blake2b(b"parent"),
                UnlockConditions::standard(seed.public_key(0)),
                Currency::new(100),
            )
            .unwrap()
            .add_output(sample_address(2), Currency::new(95))
            .unwrap()
            .build()
    }

    #[test]
    fn test_builder_fee() {
        let txn = sample_transaction();
        assert_eq!(txn.miner_fees, vec![Currency::new(5)]);
        assert_eq!(txn.total_miner_fees(), Currency::new(5));
        assert_eq!(txn.siacoin_outputs[0].value, Currency::new(95));
    }

    #[test]
    fn test_builder_rejects_overspend() {
        let result = TransactionBuilder::new()
            .add_input(blake2b(b"p"), UnlockConditions::default(), Currency::new(10))
            .unwrap()
            .add_output(sample_address(1), Currency::new(11));
        assert_eq!(
            result.unwrap_err(),
            TransactionError::OutputsExceedInputs {
                inputs: Currency::new(10),
                outputs: Currency::new(11),
            }
        );
    }

    #[test]
    fn test_builder_zero_fee() {
        let txn = TransactionBuilder::new()
            .add_input(blake2b(b"p"), UnlockConditions::default(), Currency::new(10))
            .unwrap()
            .add_output(sample_address(1), Currency::new(10))
            .unwrap()
            .build();
        assert!(txn.miner_fees.is_empty());
    }

    #[test]
    fn test_id_ignores_signatures() {
        let txn = sample_transaction();
        let mut signed = txn.clone();
        signed.transaction_signatures.push(TransactionSignature {
            parent_id: txn.siacoin_inputs[0].parent_id,
            public_key_index: 0,
            timelock: 0,
            covered_fields: CoveredFields::whole_transaction(),
            signature: vec![1; 64],
        });
        assert_eq!(txn.id(), signed.id());
        assert_ne!(txn.to_bytes(), signed.to_bytes());
    }

    #[test]
    fn test_id_changes_with_outputs() {
        let txn = sample_transaction();
        let mut other = txn.clone();
        other.siacoin_outputs[0].value = Currency::new(94);
        assert_ne!(txn.id(), other.id());
    }

    #[test]
    fn test_empty_transaction_encoding() {
        // ten empty lists
        assert_eq!(Transaction::default().to_bytes(), vec![0u8; 8 * 10]);
    }

    fn with_signature(cf: CoveredFields) -> Transaction {
        let mut txn = sample_transaction();
        txn.transaction_signatures.push(TransactionSignature {
            parent_id: txn.siacoin_inputs[0].parent_id,
            public_key_index: 0,
            timelock: 0,
            covered_fields: cf,
            signature: Vec::new(),
        });
        txn
    }

    #[test]
    fn test_sig_hash_depends_on_replay_prefix() {
        let params = ProtocolParams::default();
        let txn = with_signature(CoveredFields::whole_transaction());
        let after = txn.sig_hash(0, params.foundation_hardfork_height, &params).unwrap();
        let later = txn.sig_hash(0, params.foundation_hardfork_height + 10, &params).unwrap();
        let before = txn.sig_hash(0, params.asic_hardfork_height, &params).unwrap();
        assert_eq!(after, later);
        assert_ne!(after, before);
    }

    #[test]
    fn test_sig_hash_ignores_signature_bytes() {
        let params = ProtocolParams::default();
        let mut txn = with_signature(CoveredFields::whole_transaction());
        let before = txn.sig_hash(0, params.sign_height, &params).unwrap();
        txn.transaction_signatures[0].signature = vec![7; 64];
        assert_eq!(before, txn.sig_hash(0, params.sign_height, &params).unwrap());
    }

    #[test]
    fn test_sig_hash_errors() {
        let params = ProtocolParams::default();
        let txn = sample_transaction();
        assert_eq!(
            txn.sig_hash(0, params.sign_height, &params),
            Err(TransactionError::SignatureNotFound(0))
        );

        let txn = with_signature(CoveredFields {
            siacoin_outputs: vec![3],
            ..Default::default()
        });
        assert_eq!(
            txn.sig_hash(0, params.sign_height, &params),
            Err(TransactionError::CoveredFieldOutOfRange {
                field: "siacoinoutputs",
                index: 3
            })
        );
    }

    #[test]
    fn test_partial_sig_hash_covers_only_listed_fields() {
        let params = ProtocolParams::default();
        let txn = with_signature(CoveredFields {
            siacoin_inputs: vec![0],
            ..Default::default()
        });
        let mut changed = txn.clone();
        changed.siacoin_outputs[0].value = Currency::new(1);
        assert_eq!(
            txn.sig_hash(0, params.sign_height, &params).unwrap(),
            changed.sig_hash(0, params.sign_height, &params).unwrap()
        );
    }

    #[test]
    fn test_signature_field_layout() {
        let sig = TransactionSignature {
            parent_id: Hash256([0xaa; 32]),
            public_key_index: 7,
            timelock: 9,
            covered_fields: CoveredFields::whole_transaction(),
            signature: vec![0xbb; 64],
        };
        let bytes = sig.to_bytes();
        assert_eq!(&bytes[..32], &[0xaa; 32]);
        assert_eq!(&bytes[32..40], &7u64.to_le_bytes());
        assert_eq!(&bytes[40..48], &9u64.to_le_bytes());
        // wholetransaction flag, then ten empty index lists
        assert_eq!(bytes[48], 1);
        assert_eq!(&bytes[49..129], &[0u8; 80]);
        assert_eq!(&bytes[129..137], &64u64.to_le_bytes());
        assert_eq!(&bytes[137..], &[0xbb; 64]);
    }

    const PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    /// 2-of-2 over keys 0 and 1 of the all-zero phrase; 100 SC in, 95 SC back, 5 SC fee
    fn known_transaction() -> Transaction {
        let seed = Seed::from_phrase(PHRASE).unwrap();
        let uc = UnlockConditions::new(0, 2, vec![seed.public_key(0), seed.public_key(1)]).unwrap();
        let address = uc.unlock_hash();
        TransactionBuilder::new()
            .add_input(blake2b(b"subsidy"), uc, Currency::siacoins(100))
            .unwrap()
            .add_output(address, Currency::siacoins(95))
            .unwrap()
            .build()
    }

    #[test]
    fn test_known_transaction_id() {
        assert_eq!(
            known_transaction().id().to_string(),
            "e03ab16007d3ecc87e6c67fc80c971ea59382783a288ca8e268407459386258f"
        );
    }

    #[test]
    fn test_known_sig_hashes() {
        let params = ProtocolParams::default();
        let seed = Seed::from_phrase(PHRASE).unwrap();
        let mut txn = known_transaction();
        let parent_id = txn.siacoin_inputs[0].parent_id;

        txn.transaction_signatures.push(TransactionSignature {
            parent_id,
            public_key_index: 0,
            timelock: 0,
            covered_fields: CoveredFields::whole_transaction(),
            signature: Vec::new(),
        });
        let hash = txn.sig_hash(0, params.sign_height, &params).unwrap();
        assert_eq!(
            hash.to_string(),
            "a9a6b22253e31022c78727be574b4fd8e4172239f24c9512b756edbbceb4557a"
        );
        assert_eq!(
            txn.sig_hash(0, params.asic_hardfork_height, &params)
                .unwrap()
                .to_string(),
            "b78e4911f6f9ef57e42ad1eb49a1c8fa5a865e670602519712afc9cd2e8de204"
        );

        let signature = seed.key_pair(0).sign_hash(&hash);
        assert_eq!(
            hex::encode(signature),
            "ba7c1a8ed878a43b14eee81209b543f85eb7c04d16078d37b723345c48f5d643\
             d9c2d0339931547a741486ec15357e273c55c39876d1b730fcc3124c38a78f03"
        );
        txn.transaction_signatures[0].signature = signature.to_vec();

        // a second signature that also commits to the first one
        txn.transaction_signatures.push(TransactionSignature {
            parent_id,
            public_key_index: 1,
            timelock: 0,
            covered_fields: CoveredFields {
                whole_transaction: true,
                transaction_signatures: vec![0],
                ..Default::default()
            },
            signature: Vec::new(),
        });
        assert_eq!(
            txn.sig_hash(1, params.sign_height, &params).unwrap().to_string(),
            "865c0e05d2ea3ef594f972955f117cb2dad9f2433feb24168d460fa3c8ee696c"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut txn = with_signature(CoveredFields::whole_transaction());
        txn.arbitrary_data.push(b"hello".to_vec());
        let json = serde_json::to_string_pretty(&txn).unwrap();
        assert!(json.contains("\"siacoininputs\""));
        assert!(json.contains("\"wholetransaction\": true"));
        let parsed: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, txn);
        assert_eq!(serde_json::to_string_pretty(&parsed).unwrap(), json);
    }

    #[test]
    fn test_json_accepts_null_lists() {
        let json = r#"{"siacoininputs":null,"siacoinoutputs":null,"filecontracts":null,
            "filecontractrevisions":null,"storageproofs":null,"siafundinputs":null,
            "siafundoutputs":null,"minerfees":null,"arbitrarydata":null,
            "transactionsignatures":null}"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn, Transaction::default());
    }

    #[test]
    fn test_segment_json() {
        let proof = StorageProof {
            parent_id: blake2b(b"contract"),
            segment: Segment([9u8; SEGMENT_SIZE]),
            hash_set: vec![blake2b(b"a")],
        };
        let json = serde_json::to_string(&proof).unwrap();
        assert!(json.contains("\"segment\":[9,9,"));
        assert_eq!(serde_json::from_str::<StorageProof>(&json).unwrap(), proof);

        let short = json.replace("[9,9,", "[");
        assert!(serde_json::from_str::<StorageProof>(&short).is_err());
    }
}
