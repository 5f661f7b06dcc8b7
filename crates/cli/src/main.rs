//! Tally command-line interface
//!
//! Runs ledger operations against a SQLite database and prints JSON.

use std::sync::Arc;

use clap::Parser;
use tally_persistence::error::LedgerError;
use tracing::info;

mod commands;
mod config;
mod logging;

use commands::Command;
use config::CliConfig;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "tally", version)]
#[command(about = "Tenant-scoped accounting document ledger")]
pub struct Cli {
    #[command(flatten)]
    pub config: CliConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.config.log_level);

    if let Err(errors) = cli.config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let ledger = cli.config.ledger_config()?;
    if let Err(errors) = ledger.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let backend = Arc::new(commands::open_backend(&cli.config, &ledger)?);

    info!(
        database = %cli.config.database_url,
        tenant = cli.config.tenant.as_deref().unwrap_or("-"),
        "Starting Tally"
    );

    match commands::run(cli.command, &cli.config, &ledger, backend).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            match e.downcast_ref::<LedgerError>() {
                Some(ledger_error) => {
                    eprintln!("{}", serde_json::to_string_pretty(&ledger_error.report())?)
                }
                None => eprintln!("Error: {:#}", e),
            }
            std::process::exit(1);
        }
    }
}
