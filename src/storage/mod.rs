//! Storage for transaction files and consensus lookups

pub mod consensus;
pub mod scanner;
pub mod txn_file;

pub use consensus::{ConsensusSnapshot, ConsensusStore};
pub use scanner::{scan_unspent_subsidies, UnspentSubsidy};
pub use txn_file::{
    load_transaction, read_transaction, save_transaction, write_transaction, StorageError,
};
