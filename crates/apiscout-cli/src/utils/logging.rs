//! Logging initialization and configuration.
//!
//! This module handles setting up the tracing subscriber and color control
//! based on CLI flags and environment variables.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Log level selected by the global flags and output format.
///
/// JSON output keeps stderr to errors only unless `--verbose` was given.
pub fn log_level(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet || cli.command.format().is_machine_readable() {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Initialize the logging subsystem based on CLI flags.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Color control: disable when requested, NO_COLOR is set, or when emitting machine output
    let env_no_color = std::env::var("NO_COLOR").ok().is_some();
    if cli.no_color || env_no_color || cli.command.format().is_machine_readable() {
        color_control::set_override(false);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn level_for(args: &[&str]) -> Level {
        log_level(&Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_log_level_selection() {
        assert_eq!(level_for(&["apiscout", "discover", "https://x.test"]), Level::WARN);
        assert_eq!(level_for(&["apiscout", "-v", "discover", "https://x.test"]), Level::DEBUG);
        assert_eq!(level_for(&["apiscout", "-q", "discover", "https://x.test"]), Level::ERROR);
        assert_eq!(
            level_for(&["apiscout", "discover", "https://x.test", "--format", "json"]),
            Level::ERROR
        );
        assert_eq!(
            level_for(&["apiscout", "-v", "discover", "https://x.test", "--format", "json"]),
            Level::DEBUG
        );
    }
}
