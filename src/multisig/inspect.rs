//! Transaction inspection
//!
//! Produces a read-only report of a (partially) signed transaction: its
//! validity, where the money goes, any subsidy address update it carries,
//! non-standard elements, and the state of every attached signature.

use crate::core::{
    standalone_valid, ArbitraryData, Currency, ProtocolParams, SubsidyRekeyUpdate, Transaction,
    UnlockConditions, UnlockHash,
};
use crate::crypto::{verify_hash, Hash256, OutputId, PublicKey, TransactionId};
use std::collections::HashMap;
use std::fmt;

/// Overall standalone validity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// Well formed, waiting for more signatures
    MissingSignatures,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSummary {
    pub parent_id: OutputId,
    pub address: UnlockHash,
    pub policy: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub value: Currency,
    pub address: UnlockHash,
    /// Destination is one of the transaction's own input addresses
    pub returns_to_input: bool,
}

/// Things a signer should look at before approving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    MalformedUpdate,
    UnrecognizedData,
    DuplicateUpdate,
    FileContracts,
    FileContractRevisions,
    StorageProofs,
    SiafundInputs,
    SiafundOutputs,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Warning::MalformedUpdate => "transaction contains invalid subsidy address update",
            Warning::UnrecognizedData => "transaction contains unrecognized arbitrary data",
            Warning::DuplicateUpdate => "transaction contains more than one subsidy address update",
            Warning::FileContracts => "transaction contains file contract(s)",
            Warning::FileContractRevisions => "transaction contains file contract revision(s)",
            Warning::StorageProofs => "transaction contains storage proof(s)",
            Warning::SiafundInputs => "transaction contains siafund input(s)",
            Warning::SiafundOutputs => "transaction contains siafund output(s)",
        };
        f.write_str(msg)
    }
}

/// Result of verifying one signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Valid,
    /// No input, siafund input or revision has the signature's parent ID
    NoMatchingElement,
    KeyIndexOutOfRange,
    /// Verification failed, or the key is not ed25519
    BadSignature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheck {
    pub parent_id: Hash256,
    /// The signing key, when the index resolved to one
    pub public_key: Option<PublicKey>,
    pub status: SignatureStatus,
    /// Signature covers only part of the transaction
    pub partial_coverage: bool,
}

/// Everything `check` reports about a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionReport {
    pub id: TransactionId,
    pub validity: Validity,
    pub inputs: Vec<InputSummary>,
    pub outputs: Vec<OutputSummary>,
    pub miner_fee: Currency,
    pub updates: Vec<SubsidyRekeyUpdate>,
    pub warnings: Vec<Warning>,
    pub signatures: Vec<SignatureCheck>,
}

impl InspectionReport {
    pub fn is_valid(&self) -> bool {
        self.validity == Validity::Valid
    }
}

/// Inspect a transaction at the configured check height
pub fn inspect(txn: &Transaction, params: &ProtocolParams) -> InspectionReport {
    let height = params.check_height;

    let validity = match standalone_valid(txn, height, params) {
        Ok(()) => Validity::Valid,
        Err(e) if e.is_missing_signatures() => Validity::MissingSignatures,
        Err(e) => Validity::Invalid(e.to_string()),
    };

    let inputs: Vec<InputSummary> = txn
        .siacoin_inputs
        .iter()
        .map(|input| InputSummary {
            parent_id: input.parent_id,
            address: input.unlock_conditions.unlock_hash(),
            policy: input.unlock_conditions.description(),
        })
        .collect();

    let outputs = txn
        .siacoin_outputs
        .iter()
        .map(|output| OutputSummary {
            value: output.value,
            address: output.unlock_hash,
            returns_to_input: inputs.iter().any(|i| i.address == output.unlock_hash),
        })
        .collect();

    let mut updates = Vec::new();
    let mut warnings = Vec::new();
    for data in &txn.arbitrary_data {
        match SubsidyRekeyUpdate::classify(data) {
            ArbitraryData::Update(update) => updates.push(update),
            ArbitraryData::MalformedUpdate(_) => warnings.push(Warning::MalformedUpdate),
            ArbitraryData::Unrecognized => warnings.push(Warning::UnrecognizedData),
        }
    }
    if updates.len() > 1 {
        warnings.push(Warning::DuplicateUpdate);
    }

    let flags = [
        (!txn.file_contracts.is_empty(), Warning::FileContracts),
        (!txn.file_contract_revisions.is_empty(), Warning::FileContractRevisions),
        (!txn.storage_proofs.is_empty(), Warning::StorageProofs),
        (!txn.siafund_inputs.is_empty(), Warning::SiafundInputs),
        (!txn.siafund_outputs.is_empty(), Warning::SiafundOutputs),
    ];
    warnings.extend(flags.into_iter().filter(|(set, _)| *set).map(|(_, w)| w));

    InspectionReport {
        id: txn.id(),
        validity,
        inputs,
        outputs,
        miner_fee: txn.total_miner_fees(),
        updates,
        warnings,
        signatures: check_signatures(txn, height, params),
    }
}

fn check_signatures(txn: &Transaction, height: u64, params: &ProtocolParams) -> Vec<SignatureCheck> {
    let mut conditions: HashMap<Hash256, &UnlockConditions> = HashMap::new();
    for input in &txn.siacoin_inputs {
        conditions.insert(input.parent_id, &input.unlock_conditions);
    }
    for input in &txn.siafund_inputs {
        conditions.insert(input.parent_id, &input.unlock_conditions);
    }
    for rev in &txn.file_contract_revisions {
        conditions.insert(rev.parent_id, &rev.unlock_conditions);
    }

    txn.transaction_signatures
        .iter()
        .enumerate()
        .map(|(i, sig)| {
            let mut check = SignatureCheck {
                parent_id: sig.parent_id,
                public_key: None,
                status: SignatureStatus::Valid,
                partial_coverage: !sig.covered_fields.whole_transaction,
            };
            let Some(uc) = conditions.get(&sig.parent_id) else {
                check.status = SignatureStatus::NoMatchingElement;
                return check;
            };
            let Some(public_key) = usize::try_from(sig.public_key_index)
                .ok()
                .and_then(|idx| uc.public_keys.get(idx))
            else {
                check.status = SignatureStatus::KeyIndexOutOfRange;
                return check;
            };
            let verified = txn
                .sig_hash(i, height, params)
                .map(|hash| verify_hash(public_key, &hash, &sig.signature))
                .unwrap_or(false);
            if !verified {
                check.status = SignatureStatus::BadSignature;
            }
            check.public_key = Some(public_key.clone());
            check
        })
        .collect()
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction summary:")?;
        writeln!(f)?;
        writeln!(f, "ID:    {}", self.id)?;
        match &self.validity {
            Validity::Valid => writeln!(f, "Valid: Yes")?,
            Validity::MissingSignatures => {
                writeln!(f, "Valid: No (transaction is missing signatures)")?
            }
            Validity::Invalid(reason) => writeln!(f, "Valid: No ({})", reason)?,
        }
        writeln!(f)?;

        writeln!(f, "Inputs:")?;
        for input in &self.inputs {
            writeln!(f, "  ID:   {}", input.parent_id)?;
            writeln!(f, "  Addr: {} ({})", input.address, input.policy)?;
        }
        writeln!(f)?;

        writeln!(f, "Outputs:")?;
        for output in &self.outputs {
            let dest = if output.returns_to_input {
                "returned to input"
            } else {
                "to"
            };
            writeln!(f, "  {:>8} {} {}", output.value.human_string(), dest, output.address)?;
        }
        writeln!(f)?;
        writeln!(f, "Miner Fee: {}", self.miner_fee.human_string())?;
        writeln!(f)?;

        for update in &self.updates {
            writeln!(f, "Subsidy Address Update:")?;
            writeln!(f, "New Primary:  {}", update.new_primary)?;
            writeln!(f, "New Failsafe: {}", update.new_failsafe)?;
            writeln!(f)?;
        }
        for warning in &self.warnings {
            writeln!(f, "WARNING: {}", warning)?;
        }

        writeln!(f, "Signatures:")?;
        if self.signatures.is_empty() {
            writeln!(f, "  Transaction has no signatures")?;
        }
        for sig in &self.signatures {
            match (&sig.status, &sig.public_key) {
                (SignatureStatus::NoMatchingElement, _) => writeln!(
                    f,
                    "  INVALID signature on {}: no transaction element with that ID",
                    sig.parent_id
                )?,
                (SignatureStatus::KeyIndexOutOfRange, _) => writeln!(
                    f,
                    "  INVALID signature on {}: public key index is out-of-bounds",
                    sig.parent_id
                )?,
                (status, key) => {
                    let label = if *status == SignatureStatus::Valid {
                        "Valid"
                    } else {
                        "INVALID"
                    };
                    let key = key.as_ref().map(|k| k.to_string()).unwrap_or_default();
                    writeln!(f, "  {} signature from key {}", label, key)?;
                    writeln!(f, "    on {}", sig.parent_id)?;
                    if *status == SignatureStatus::Valid && sig.partial_coverage {
                        writeln!(f, "    (WARNING: signature does not cover whole transaction)")?;
                    }
                }
            }
        }
        Ok(())
    }
}
