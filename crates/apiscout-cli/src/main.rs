//! apiscout CLI - discover API documentation and extract endpoints in parallel
//!
//! This is the main entry point for the apiscout command-line interface.
//! Command implementations live in separate modules.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use utils::logging::initialize_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    let config = utils::load_config(cli.config.as_deref())?;
    execute_command(&cli, config).await
}

async fn execute_command(cli: &Cli, config: apiscout_core::Config) -> Result<()> {
    match &cli.command {
        Commands::Discover(args) => commands::discover(args, config).await,
        Commands::Extract(args) => commands::extract(args, config).await,
        Commands::Partition(args) => commands::partition(args, &config),
    }
}
