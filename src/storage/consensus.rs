//! Read-only view of the consensus set
//!
//! The scanner only needs three lookups, so any store that can answer them
//! will do. [`ConsensusSnapshot`] is a JSON export of just those lookups.

use super::txn_file::{save_json_atomic, StorageError};
use crate::core::SiacoinOutput;
use crate::crypto::{BlockId, OutputId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::Path;

/// The lookups needed to find unspent subsidy outputs
pub trait ConsensusStore {
    /// Current chain height
    fn block_height(&self) -> Result<u64, StorageError>;

    /// ID of the block at `height`, if recorded
    fn block_id_at_height(&self, height: u64) -> Result<Option<BlockId>, StorageError>;

    /// An unspent siacoin output; `None` once spent or if never created
    fn siacoin_output(&self, id: &OutputId) -> Result<Option<SiacoinOutput>, StorageError>;
}

/// In-memory consensus snapshot, persisted as JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSnapshot {
    pub height: u64,
    #[serde(default)]
    pub blocks: BTreeMap<u64, BlockId>,
    #[serde(default)]
    pub outputs: BTreeMap<OutputId, SiacoinOutput>,
}

impl ConsensusSnapshot {
    pub fn new(height: u64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    pub fn insert_block(&mut self, height: u64, id: BlockId) {
        self.blocks.insert(height, id);
    }

    pub fn insert_output(&mut self, id: OutputId, output: SiacoinOutput) {
        self.outputs.insert(id, output);
    }

    /// Load a snapshot file
    pub fn load_from_file(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "consensus snapshot {} not found",
                path.display()
            )));
        }
        let file = fs::File::open(path)?;
        let snapshot: Self = serde_json::from_reader(BufReader::new(file))?;
        log::debug!(
            "Loaded consensus snapshot at height {} ({} blocks, {} outputs)",
            snapshot.height,
            snapshot.blocks.len(),
            snapshot.outputs.len()
        );
        Ok(snapshot)
    }

    /// Save the snapshot, replacing the file atomically
    pub fn save_to_file(&self, path: &Path) -> Result<(), StorageError> {
        save_json_atomic(path, self)
    }
}

impl ConsensusStore for ConsensusSnapshot {
    fn block_height(&self) -> Result<u64, StorageError> {
        Ok(self.height)
    }

    fn block_id_at_height(&self, height: u64) -> Result<Option<BlockId>, StorageError> {
        Ok(self.blocks.get(&height).copied())
    }

    fn siacoin_output(&self, id: &OutputId) -> Result<Option<SiacoinOutput>, StorageError> {
        Ok(self.outputs.get(id).cloned())
    }
}
