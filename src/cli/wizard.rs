//! Transaction construction wizard
//!
//! Asks for subsidy inputs, outputs and an optional address update, then
//! builds the unsigned transaction. Malformed answers are re-asked;
//! overspending aborts.

use super::commands::CliResult;
use super::prompt::Prompter;
use crate::core::{
    Currency, SubsidyRekeyUpdate, Transaction, TransactionBuilder, UnlockConditions, UnlockHash,
};
use crate::crypto::Hash256;

/// Run the wizard and return the unsigned transaction
pub fn run_txn_wizard<P: Prompter + ?Sized>(p: &mut P) -> CliResult<Transaction> {
    let mut builder = TransactionBuilder::new();

    p.say("--- Inputs ---");
    loop {
        let id = p.ask("ID (or 'done')")?;
        if id == "done" {
            break;
        }
        let Ok(parent_id) = id.parse::<Hash256>() else {
            p.say("Invalid ID");
            continue;
        };
        let Some(uc) = parse_unlock_conditions(&p.ask("UnlockConditions (as JSON)")?) else {
            p.say("Invalid UnlockConditions");
            continue;
        };
        let Ok(value) = Currency::parse_sc(&p.ask("Value (in SC)")?) else {
            p.say("Invalid value");
            continue;
        };
        builder = builder.add_input(parent_id, uc, value)?;
    }

    p.say("--- Outputs ---");
    loop {
        let addr = p.ask("Address (or 'done')")?;
        if addr == "done" {
            break;
        }
        let Ok(address) = addr.parse::<UnlockHash>() else {
            p.say("Invalid address");
            continue;
        };
        let Ok(amount) = Currency::parse_sc(&p.ask("Amount (in SC)")?) else {
            p.say("Invalid amount");
            continue;
        };
        builder = builder
            .add_output(address, amount)
            .map_err(|e| format!("Invalid transaction: {}", e))?;
    }

    let fee = builder.fee();
    if fee.is_zero() {
        p.say("Warning: outputs exactly equal inputs; miner fee will be zero");
    } else {
        p.say(&format!(
            "Remaining input value ({}) will be used as miner fee.",
            fee.human_string()
        ));
    }

    let resp = p
        .ask("Include a subsidy address update in this transaction? [y/n]")?
        .to_lowercase();
    if resp == "y" || resp == "yes" {
        let new_primary: UnlockHash = p
            .ask("New Primary Address")?
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))?;
        let new_failsafe: UnlockHash = p
            .ask("New Failsafe Address")?
            .parse()
            .map_err(|e| format!("Invalid address: {}", e))?;
        builder = builder.with_update(&SubsidyRekeyUpdate::new(new_primary, new_failsafe));
    }

    Ok(builder.build())
}

/// Accepts the ledger form and the `addr` output form; rejects `m > n`
fn parse_unlock_conditions(s: &str) -> Option<UnlockConditions> {
    let uc: UnlockConditions = serde_json::from_str(s).ok()?;
    UnlockConditions::new(uc.timelock, uc.signatures_required, uc.public_keys).ok()
}
