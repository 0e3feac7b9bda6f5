//! CLI commands for the multisig tool
//!
//! Implements all command handlers for the CLI interface.

use super::prompt::{PhraseSource, Prompter};
use super::wizard::run_txn_wizard;
use crate::core::{derive_address, standalone_valid, AddressDescription, ProtocolParams};
use crate::crypto::{PublicKey, Seed};
use crate::multisig::{inspect, sign_transaction, SignOutcome, SignerConfig};
use crate::network::WalrusClient;
use crate::storage::{load_transaction, save_transaction, scan_unspent_subsidies, ConsensusSnapshot};
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Read and parse a seed phrase
pub fn read_seed<S: PhraseSource + ?Sized>(source: &mut S) -> CliResult<Seed> {
    let phrase = source
        .read_phrase()
        .map_err(|e| format!("Could not read seed phrase: {}", e))?;
    let seed = Seed::from_phrase(&phrase).map_err(|e| format!("Invalid seed: {}", e))?;
    Ok(seed)
}

/// Generate a new seed
pub fn cmd_seed() -> CliResult<()> {
    println!("{}", Seed::generate().phrase());
    Ok(())
}

/// Derive a public key from a seed
pub fn cmd_pubkey<S: PhraseSource + ?Sized>(source: &mut S, index: u32) -> CliResult<()> {
    let seed = read_seed(source)?;
    println!("{}", seed.public_key(u64::from(index)));
    Ok(())
}

/// Derive a multisig address
pub fn cmd_addr(timelock: u64, signatures_required: u64, keys: &str) -> CliResult<()> {
    let public_keys =
        PublicKey::parse_list(keys).map_err(|e| format!("Invalid pubkey: {}", e))?;
    let (uc, address) = derive_address(timelock, signatures_required, public_keys)?;

    println!(
        "{}",
        serde_json::to_string_pretty(&AddressDescription::from(&uc))?
    );
    println!("{}", address);
    Ok(())
}

/// List unspent subsidy outputs
pub fn cmd_outputs(snapshot: &Path, params: &ProtocolParams) -> CliResult<()> {
    let store = ConsensusSnapshot::load_from_file(snapshot)
        .map_err(|e| format!("Could not open consensus snapshot: {}", e))?;
    let unspent = scan_unspent_subsidies(&store, params)?;

    println!("Outputs:");
    for subsidy in &unspent {
        println!("{}", subsidy);
    }
    if unspent.is_empty() {
        println!("   No unspent subsidy outputs");
    }
    Ok(())
}

/// Run the transaction wizard and write the result
pub fn cmd_txn<P: Prompter + ?Sized>(file: &Path, prompter: &mut P) -> CliResult<()> {
    let txn = run_txn_wizard(prompter)?;
    save_transaction(file, &txn)
        .map_err(|e| format!("Could not write transaction to disk: {}", e))?;
    println!("💾 Wrote unsigned transaction to {}", file.display());
    Ok(())
}

/// Add a signature to a transaction file
pub fn cmd_sign<S: PhraseSource + ?Sized>(
    file: &Path,
    source: &mut S,
    config: &SignerConfig,
    params: &ProtocolParams,
) -> CliResult<()> {
    let mut txn = load_transaction(file)
        .map_err(|e| format!("Could not read transaction file: {}", e))?;

    // Check before asking for the seed
    match standalone_valid(&txn, params.sign_height, params) {
        Ok(()) => {
            println!("✅ Transaction is already fully signed.");
            return Ok(());
        }
        Err(e) if e.is_missing_signatures() => {}
        Err(e) => return Err(format!("Transaction is invalid: {}", e).into()),
    }

    let seed = read_seed(source)?;
    match sign_transaction(&mut txn, &seed, config, params)? {
        SignOutcome::AlreadyComplete => {
            println!("✅ Transaction is already fully signed.");
        }
        SignOutcome::NothingToContribute => {
            return Err("Seed did not correspond to any missing signatures.".into());
        }
        SignOutcome::Added { slot, complete } => {
            save_transaction(file, &txn)
                .map_err(|e| format!("Could not write transaction to disk: {}", e))?;
            println!("✍️  Signature added successfully.");
            println!("   Input: {}", slot.parent_id);
            println!("   Key:   #{}", slot.public_key_index);
            if complete {
                println!("✅ Transaction is now fully signed.");
            }
        }
    }
    Ok(())
}

/// Print transaction details
pub fn cmd_check(file: &Path, params: &ProtocolParams) -> CliResult<()> {
    let txn = load_transaction(file)
        .map_err(|e| format!("Could not read transaction file: {}", e))?;
    print!("{}", inspect(&txn, params));
    Ok(())
}

/// Broadcast a fully signed transaction
pub async fn cmd_broadcast(file: &Path, server: &str, params: &ProtocolParams) -> CliResult<()> {
    let txn = load_transaction(file)
        .map_err(|e| format!("Could not read transaction file: {}", e))?;
    standalone_valid(&txn, params.broadcast_height, params)
        .map_err(|e| format!("Transaction is standalone-invalid: {}", e))?;

    println!("📡 Broadcasting transaction...");
    WalrusClient::new(server)?
        .broadcast(std::slice::from_ref(&txn))
        .await
        .map_err(|e| format!("Broadcast failed: {}", e))?;

    println!("✅ Transaction broadcast successfully.");
    println!("   Transaction ID: {}", txn.id());
    Ok(())
}
