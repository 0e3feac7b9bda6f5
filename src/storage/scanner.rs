//! Unspent subsidy output scanner
//!
//! Walks the subsidy schedule below the current height and reports the
//! subsidy outputs that are still unspent.

use super::consensus::ConsensusStore;
use super::txn_file::StorageError;
use crate::core::{subsidy_output_id, ProtocolParams, SiacoinOutput, HASTINGS_PER_SC};
use crate::crypto::OutputId;
use std::fmt;

/// A subsidy output that has not been spent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnspentSubsidy {
    pub height: u64,
    pub id: OutputId,
    pub output: SiacoinOutput,
}

impl fmt::Display for UnspentSubsidy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block {:>6}: {} {} ({} SC)",
            self.height,
            self.id,
            self.output.unlock_hash,
            self.output.value.0 / HASTINGS_PER_SC
        )
    }
}

/// Find every unspent subsidy output below the store's current height
pub fn scan_unspent_subsidies<S: ConsensusStore + ?Sized>(
    store: &S,
    params: &ProtocolParams,
) -> Result<Vec<UnspentSubsidy>, StorageError> {
    let current_height = store.block_height()?;
    let mut unspent = Vec::new();

    for height in params.subsidy_heights(current_height) {
        let Some(block_id) = store.block_id_at_height(height)? else {
            log::debug!("No block recorded at height {}", height);
            continue;
        };
        let id = subsidy_output_id(&block_id);
        match store.siacoin_output(&id)? {
            Some(output) => unspent.push(UnspentSubsidy { height, id, output }),
            None => log::debug!("Subsidy at height {} already spent", height),
        }
    }

    log::info!(
        "Found {} unspent subsidy outputs below height {}",
        unspent.len(),
        current_height
    );
    Ok(unspent)
}
