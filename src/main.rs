//! Multisign CLI Application
//!
//! Creates, co-signs, inspects and broadcasts transactions that spend
//! Foundation subsidy outputs.

use clap::{Parser, Subcommand};
use multisign::cli::{self, StdinPrompter, TerminalPhrase};
use multisign::core::ProtocolParams;
use multisign::multisig::{SignerConfig, DEFAULT_KEY_SEARCH_LIMIT};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "multisign")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Multisig signing tool for Foundation subsidy outputs", long_about = None)]
struct Cli {
    /// Number of seed keys searched when signing
    #[arg(long, global = true, default_value_t = DEFAULT_KEY_SEARCH_LIMIT)]
    key_limit: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a seed
    Seed,

    /// Derive a pubkey from a seed and a key index
    Pubkey {
        /// Key index
        index: u32,
    },

    /// Generate a multisig address for receiving subsidies
    Addr {
        /// Block height before which the address cannot spend
        timelock: u64,

        /// Number of signatures required
        m: u64,

        /// Comma-separated public keys (ed25519:hex,...)
        pubkeys: String,
    },

    /// List unspent subsidy outputs in a consensus snapshot
    Outputs {
        /// Consensus snapshot file
        snapshot: PathBuf,
    },

    /// Launch the transaction construction wizard
    Txn {
        /// File to write the unsigned transaction to
        file: PathBuf,
    },

    /// Add a signature to a subsidy transaction
    Sign {
        /// Transaction file
        file: PathBuf,
    },

    /// Print transaction details, including signature validity
    Check {
        /// Transaction file
        file: PathBuf,
    },

    /// Broadcast a subsidy transaction
    Broadcast {
        /// Transaction file
        file: PathBuf,

        /// Walrus server address
        server: String,
    },
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> cli::CliResult<()> {
    let params = ProtocolParams::default();
    let signer_config = SignerConfig::with_key_search_limit(cli.key_limit);

    match cli.command {
        Commands::Seed => cli::cmd_seed()?,

        Commands::Pubkey { index } => cli::cmd_pubkey(&mut TerminalPhrase, index)?,

        Commands::Addr {
            timelock,
            m,
            pubkeys,
        } => cli::cmd_addr(timelock, m, &pubkeys)?,

        Commands::Outputs { snapshot } => cli::cmd_outputs(&snapshot, &params)?,

        Commands::Txn { file } => cli::cmd_txn(&file, &mut StdinPrompter)?,

        Commands::Sign { file } => {
            cli::cmd_sign(&file, &mut TerminalPhrase, &signer_config, &params)?
        }

        Commands::Check { file } => cli::cmd_check(&file, &params)?,

        // Broadcast needs an async runtime
        Commands::Broadcast { file, server } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cli::cmd_broadcast(&file, &server, &params))?;
        }
    }

    Ok(())
}
