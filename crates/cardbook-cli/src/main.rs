//! Command-line operator for the cardbook ledger
//!
//! Registers participants, issues cautions and dismissals, and audits the
//! journal file.

use anyhow::Result;
use cardbook_cli::commands::{self, Mutation};
use cardbook_cli::config::{CliConfig, DEFAULT_CONFIG_PATH};
use cardbook_core::PrincipalId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cardbook")]
#[command(about = "Cardbook - owner-gated caution and dismissal ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config naming the ledger owner
    Init {
        /// Owner principal UUID (random if omitted)
        #[arg(long)]
        owner: Option<PrincipalId>,
    },

    /// Register a participant
    Register {
        /// Participant UUID or external handle
        participant: String,
        /// Calling principal (defaults to the configured owner)
        #[arg(long = "as")]
        caller: Option<PrincipalId>,
    },

    /// Issue a caution
    Caution {
        /// Participant UUID or external handle
        participant: String,
        /// Calling principal (defaults to the configured owner)
        #[arg(long = "as")]
        caller: Option<PrincipalId>,
    },

    /// Issue a dismissal
    Dismiss {
        /// Participant UUID or external handle
        participant: String,
        /// Calling principal (defaults to the configured owner)
        #[arg(long = "as")]
        caller: Option<PrincipalId>,
    },

    /// Show a participant's counters
    Record {
        /// Participant UUID or external handle
        participant: String,
    },

    /// Print journal entries
    Log {
        /// Only entries naming this participant
        #[arg(short, long)]
        participant: Option<String>,
    },

    /// Verify the journal and summarize every record
    Verify,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = CliConfig::resolve_path(&cli.config);

    let mut config = CliConfig::load(&config_path)?;
    config.merge_with_env()?;
    config.validate()?;

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { owner } => {
            let config = commands::init(&config_path, owner)?;
            if let Some(owner) = config.owner {
                println!("owner {owner} written to {}", config_path.display());
            }
        }

        Commands::Register {
            participant,
            caller,
        } => run_mutation(&config, Mutation::Register, &participant, caller)?,

        Commands::Caution {
            participant,
            caller,
        } => run_mutation(&config, Mutation::Caution, &participant, caller)?,

        Commands::Dismiss {
            participant,
            caller,
        } => run_mutation(&config, Mutation::Dismiss, &participant, caller)?,

        Commands::Record { participant } => {
            let participant = commands::parse_participant(&participant);
            let (cautions, dismissals) = commands::record(&config, participant)?;
            println!("cautions={cautions} dismissals={dismissals}");
        }

        Commands::Log { participant } => {
            let participant = participant.as_deref().map(commands::parse_participant);
            print!("{}", commands::log(&config, participant)?);
        }

        Commands::Verify => {
            let report = commands::audit(&config)?;
            print!("{}", commands::render_report(&report));
        }
    }

    Ok(())
}

fn run_mutation(
    config: &CliConfig,
    mutation: Mutation,
    participant: &str,
    caller: Option<PrincipalId>,
) -> Result<()> {
    let participant = commands::parse_participant(participant);
    let entry = commands::mutate(config, mutation, participant, caller)?;
    println!("{}", commands::render_entry(&entry));
    Ok(())
}
