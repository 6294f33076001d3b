//! Extract command implementation

use anyhow::{Context, Result};
use apiscout_core::{AnthropicAnalyzerFactory, Config, Pipeline, Selection};
use is_terminal::IsTerminal;
use std::sync::Arc;
use tracing::warn;

use crate::cli::ExtractArgs;
use crate::output::progress::ExtractionProgress;
use crate::output::{OutputFormat, print_json, text, write_json};

/// Execute the extract command
///
/// Partial results (some chunks failed) are printed and return `Ok`; only
/// hard failures such as an unreachable root page return an error.
pub async fn execute(args: &ExtractArgs, mut config: Config) -> Result<()> {
    apply_overrides(args, &mut config);
    config.validate()?;

    let selection = args
        .selection
        .as_deref()
        .map(Selection::load)
        .transpose()
        .context("Failed to load selection")?;

    let factory = AnthropicAnalyzerFactory::from_config(config.analyzer.clone())?;

    let show_progress = !args.no_progress
        && !args.format.is_machine_readable()
        && std::io::stderr().is_terminal();
    let progress = if show_progress {
        ExtractionProgress::new()
    } else {
        ExtractionProgress::hidden()
    };
    let sink = progress.clone();
    let pipeline =
        Pipeline::from_config(&config, Arc::new(factory))?.with_progress(move |p| sink.update(p));

    let output = pipeline.run(&args.url, selection.as_ref()).await;
    progress.finish();
    let output = output?;

    if output.is_partial() {
        warn!(
            failed = output.report.failed(),
            missing = output.report.missing_chunks.len(),
            "Extraction finished with partial results"
        );
    }

    if let Some(path) = &args.output {
        write_json(path, &output)?;
    }

    match args.format {
        OutputFormat::Text => {
            print!("{}", text::render_merged(&output.merged));
            println!();
            print!("{}", text::render_summary(&output));
        },
        OutputFormat::Json => print_json(&output)?,
    }
    Ok(())
}

fn apply_overrides(args: &ExtractArgs, config: &mut Config) {
    if let Some(chunk_size) = args.chunk_size {
        config.extraction.chunk_size = chunk_size;
    }
    if let Some(workers) = args.workers {
        config.extraction.max_workers = workers;
    }
    if let Some(timeout) = args.timeout {
        config.extraction.chunk_timeout_secs = timeout;
    }
    if args.retry_failed {
        config.extraction.retry_failed = true;
    }
    if let Some(depth) = args.depth {
        config.discovery.max_depth = depth;
    }
}
