//! # apiscout-core
//!
//! Core functionality for apiscout: discover an API's documentation, extract
//! every endpoint in parallel chunks, and merge the results back into
//! per-category endpoint lists.
//!
//! ## Architecture
//!
//! Data flows through five stages:
//!
//! - **Discovery** ([`Discoverer`]): crawls the docs site via a
//!   [`PageFetcher`] and builds a [`Catalog`] of categories and endpoints
//! - **Partitioning** ([`partition`]): splits the (optionally selected)
//!   endpoints into fixed-size, sequentially numbered [`Chunk`]s
//! - **Dispatch** ([`Dispatcher`]): runs a fresh [`ContentAnalyzer`] per
//!   chunk on a bounded worker pool, containing per-chunk failures
//! - **Merge** ([`merge`]): regroups chunk results by category in original
//!   discovery order
//! - **Pipeline** ([`Pipeline`]): wires the stages together
//!
//! ## Quick Start
//!
//! ```rust
//! use apiscout_core::{
//!     merge, partition, Catalog, Category, ChunkExtraction, ChunkResult, EndpointRef,
//! };
//!
//! let users = Category::new("Users", "User accounts")
//!     .with_endpoint(EndpointRef::new("List users", "/users", "https://docs.example.com/users"))
//!     .with_endpoint(EndpointRef::new(
//!         "Get user",
//!         "/users/{id}",
//!         "https://docs.example.com/users",
//!     ));
//! let catalog = Catalog::new("https://docs.example.com", vec![users]);
//!
//! let chunks = partition(&catalog, None, 1)?;
//! assert_eq!(chunks.len(), 2);
//! assert!(chunks.iter().all(|c| c.total_chunks == 2));
//!
//! let results: Vec<ChunkResult> = chunks
//!     .iter()
//!     .map(|c| ChunkResult::success(c, ChunkExtraction::default()))
//!     .collect();
//! let merged = merge(&results);
//! assert_eq!(merged.categories[0].name, "Users");
//! # Ok::<(), apiscout_core::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Hard failures (discovery, configuration) are returned as [`Error`].
//! Per-chunk failures never escape the dispatcher; they are recorded on the
//! chunk's [`ChunkResult`]:
//!
//! ```rust,no_run
//! use apiscout_core::{Error, Pipeline};
//!
//! # async fn example(pipeline: Pipeline) {
//! match pipeline.run("https://docs.example.com", None).await {
//!     Ok(output) if output.is_partial() => eprintln!("{} chunks failed", output.summary().failed),
//!     Ok(output) => println!("{} endpoints", output.merged.endpoint_count()),
//!     Err(Error::Discovery { url, reason }) => eprintln!("cannot read {url}: {reason}"),
//!     Err(e) => eprintln!("error: {e}"),
//! }
//! # }
//! ```

/// Content analyzer trait and the Messages API backed implementation
pub mod analyzer;
/// Configuration loading and defaults
pub mod config;
/// Documentation crawling and endpoint heuristics
pub mod discovery;
/// Bounded parallel dispatch of chunks
pub mod dispatch;
/// Error types and result aliases
pub mod error;
/// Web page fetching and HTML simplification
pub mod fetcher;
/// Category-ordered merge of chunk results
pub mod merge;
/// Endpoint partitioning and selections
pub mod partition;
/// End-to-end pipeline glue
pub mod pipeline;
/// Core data types and structures
pub mod types;

// Re-export commonly used types
pub use analyzer::{AnalyzerFactory, AnthropicAnalyzer, AnthropicAnalyzerFactory, ContentAnalyzer};
pub use config::{AnalyzerConfig, Config, DiscoveryConfig, ExtractionConfig};
pub use discovery::Discoverer;
pub use dispatch::{
    ChunkProgress, DEFAULT_MAX_WORKERS, DispatchConfig, DispatchReport, Dispatcher,
    ProgressCallback, RateLimiter,
};
pub use error::{Error, Result};
pub use fetcher::{FetchedPage, HttpFetcher, PageFetcher, PageHeading, PageLink};
pub use merge::merge;
pub use partition::{DEFAULT_CHUNK_SIZE, Selection, partition};
pub use pipeline::{Pipeline, PipelineOutput, PipelineSummary, extract};
pub use types::*;
