//! # Output Formatting
//!
//! Every command renders either human-readable text (colored, aligned) or a
//! single pretty-printed JSON document on stdout. Logs and the progress bar
//! always go to stderr so JSON output can be piped.
//!
//! - [`text`]: human-readable renderers
//! - [`progress`]: indicatif progress bar driven by dispatcher callbacks

pub mod progress;
pub mod text;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

/// Output format for CLI results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted text.
    #[default]
    Text,
    /// JSON for machine consumption.
    Json,
}

impl OutputFormat {
    /// Check if this format is machine-readable.
    #[must_use]
    pub const fn is_machine_readable(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Write `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}
