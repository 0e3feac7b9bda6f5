//! Networking
//!
//! The only network operation is handing a finished transaction to a
//! walrus server for relay.

pub mod broadcast;

pub use broadcast::{BroadcastError, WalrusClient};
