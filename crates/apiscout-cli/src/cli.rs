//! # CLI Structure and Argument Parsing
//!
//! The CLI follows a standard command-subcommand pattern:
//!
//! - **Global options**: apply to all commands (`--verbose`, `--quiet`, `--config`)
//! - **Subcommands**: `discover`, `extract`, `partition`
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Inspect what a docs site exposes
//! apiscout discover https://docs.example.com/api/ --depth 2
//!
//! # Preview how a saved catalog would be chunked
//! apiscout partition catalog.json --chunk-size 8
//!
//! # Full run: discover, extract in parallel, merge
//! apiscout extract https://docs.example.com/api/ --workers 4 --output endpoints.json
//! ```
//!
//! ## Exit Codes
//!
//! Hard failures (unreachable root page, bad config, unreadable files) exit
//! non-zero. Runs where some chunks failed still exit 0 and report the
//! failures, since the successfully extracted endpoints are usable.

use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the `apiscout` command
#[derive(Parser, Clone, Debug)]
#[command(name = "apiscout")]
#[command(version)]
#[command(about = "apiscout - Discover API documentation and extract endpoints in parallel")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages (only show errors)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output (also honors `NO_COLOR`)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (defaults to `APISCOUT_CONFIG` or the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Crawl a documentation site and print the discovered catalog
    Discover(DiscoverArgs),

    /// Discover, extract every endpoint in parallel chunks, and merge by category
    Extract(ExtractArgs),

    /// Show how a saved catalog would be split into chunks
    Partition(PartitionArgs),
}

impl Commands {
    /// Output format requested by the command.
    pub const fn format(&self) -> OutputFormat {
        match self {
            Self::Discover(args) => args.format,
            Self::Extract(args) => args.format,
            Self::Partition(args) => args.format,
        }
    }
}

/// Arguments for `apiscout discover`
#[derive(Args, Clone, Debug)]
pub struct DiscoverArgs {
    /// Root documentation URL
    pub url: String,

    /// Navigation hops to follow from the root page
    #[arg(long)]
    pub depth: Option<usize>,

    /// Maximum pages to fetch
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Keep only endpoints whose title or path contains this text
    #[arg(long)]
    pub query: Option<String>,

    /// Write the catalog JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for `apiscout extract`
#[derive(Args, Clone, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExtractArgs {
    /// Root documentation URL
    pub url: String,

    /// JSON selection file: `{"Category": ["/path", ...]}`
    #[arg(long, value_name = "FILE")]
    pub selection: Option<PathBuf>,

    /// Endpoints per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Maximum concurrent chunk workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-chunk timeout in seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Re-run failed chunks once
    #[arg(long)]
    pub retry_failed: bool,

    /// Navigation hops to follow during discovery
    #[arg(long)]
    pub depth: Option<usize>,

    /// Write the merged result JSON to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for `apiscout partition`
#[derive(Args, Clone, Debug)]
pub struct PartitionArgs {
    /// Catalog JSON file (as written by `discover --output`)
    pub catalog: PathBuf,

    /// JSON selection file: `{"Category": ["/path", ...]}`
    #[arg(long, value_name = "FILE")]
    pub selection: Option<PathBuf>,

    /// Endpoints per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
