//! Shared helpers for CLI commands

pub mod logging;

use anyhow::{Context, Result};
use apiscout_core::Config;
use std::path::Path;

/// Load configuration from `--config`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}
