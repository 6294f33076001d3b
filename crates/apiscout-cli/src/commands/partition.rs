//! Partition command implementation

use anyhow::{Context, Result};
use apiscout_core::{Catalog, Config, Selection, partition};
use std::fs;

use crate::cli::PartitionArgs;
use crate::output::{OutputFormat, print_json, text};

/// Execute the partition command
pub fn execute(args: &PartitionArgs, config: &Config) -> Result<()> {
    let content = fs::read_to_string(&args.catalog)
        .with_context(|| format!("Failed to read catalog '{}'", args.catalog.display()))?;
    let catalog: Catalog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog '{}'", args.catalog.display()))?;

    let selection = args
        .selection
        .as_deref()
        .map(Selection::load)
        .transpose()
        .context("Failed to load selection")?;

    let chunk_size = args.chunk_size.unwrap_or(config.extraction.chunk_size);
    let chunks = partition(&catalog, selection.as_ref(), chunk_size)?;

    match args.format {
        OutputFormat::Text => print!("{}", text::render_chunks(&chunks)),
        OutputFormat::Json => print_json(&chunks)?,
    }
    Ok(())
}
