//! Command-line interface
//!
//! Command handlers, the transaction wizard, and the prompt abstractions
//! they read input through.

pub mod commands;
pub mod prompt;
pub mod wizard;

pub use commands::{
    cmd_addr, cmd_broadcast, cmd_check, cmd_outputs, cmd_pubkey, cmd_seed, cmd_sign, cmd_txn,
    read_seed, CliResult,
};
pub use prompt::{
    PhraseSource, Prompter, ScriptedPrompter, StaticPhrase, StdinPrompter, TerminalPhrase,
};
pub use wizard::run_txn_wizard;
