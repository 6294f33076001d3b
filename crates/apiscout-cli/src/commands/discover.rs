//! Discover command implementation

use anyhow::Result;
use apiscout_core::{Config, Discoverer, HttpFetcher};
use std::sync::Arc;

use crate::cli::DiscoverArgs;
use crate::output::{OutputFormat, print_json, text, write_json};

/// Execute the discover command
pub async fn execute(args: &DiscoverArgs, mut config: Config) -> Result<()> {
    if let Some(depth) = args.depth {
        config.discovery.max_depth = depth;
    }
    if let Some(max_pages) = args.max_pages {
        config.discovery.max_pages = max_pages;
    }
    if args.query.is_some() {
        config.discovery.query.clone_from(&args.query);
    }
    config.validate()?;

    let fetcher = HttpFetcher::with_options(
        config.discovery.request_timeout(),
        &config.discovery.user_agent,
    )?;
    let discoverer = Discoverer::new(Arc::new(fetcher), config.discovery);
    let catalog = discoverer.discover(&args.url).await?;

    if let Some(path) = &args.output {
        write_json(path, &catalog)?;
    }

    match args.format {
        OutputFormat::Text => print!("{}", text::render_catalog(&catalog)),
        OutputFormat::Json => print_json(&catalog)?,
    }
    Ok(())
}
