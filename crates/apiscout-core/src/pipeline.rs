//! End-to-end extraction: discover → partition → dispatch → merge.

use crate::analyzer::AnalyzerFactory;
use crate::dispatch::{ChunkProgress, DispatchConfig, DispatchReport, Dispatcher};
use crate::fetcher::{HttpFetcher, PageFetcher};
use crate::partition::{Selection, partition};
use crate::{Catalog, Config, Discoverer, MergedOutput, Result, merge};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutput {
    /// Catalog the run extracted from.
    pub catalog: Catalog,
    /// Endpoints selected for extraction.
    pub endpoints_selected: usize,
    /// Per-chunk outcome and integrity findings.
    pub report: DispatchReport,
    /// Category-ordered extraction result.
    pub merged: MergedOutput,
}

/// Counts shown to users after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    /// Categories in the catalog.
    pub categories: usize,
    /// Endpoints selected for extraction.
    pub endpoints_selected: usize,
    /// Chunks dispatched.
    pub chunks: usize,
    /// Chunks that succeeded.
    pub succeeded: usize,
    /// Chunks that failed.
    pub failed: usize,
    /// Chunks that never reported back.
    pub missing: usize,
}

impl PipelineOutput {
    /// Summarize the run.
    #[must_use]
    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            categories: self.catalog.categories.len(),
            endpoints_selected: self.endpoints_selected,
            chunks: self.report.results.len(),
            succeeded: self.report.succeeded(),
            failed: self.report.failed(),
            missing: self.report.missing_chunks.len(),
        }
    }

    /// Returns `true` when some chunks failed or went missing.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.report.failed() > 0 || !self.report.is_complete()
    }
}

/// Wires discovery, partitioning, dispatch and merge together.
#[derive(Debug)]
pub struct Pipeline {
    discoverer: Discoverer,
    dispatcher: Dispatcher,
    chunk_size: usize,
}

impl Pipeline {
    /// Assemble a pipeline from its parts.
    #[must_use]
    pub const fn new(discoverer: Discoverer, dispatcher: Dispatcher, chunk_size: usize) -> Self {
        Self {
            discoverer,
            dispatcher,
            chunk_size,
        }
    }

    /// Build a pipeline from configuration, fetching pages over HTTP.
    pub fn from_config(config: &Config, factory: Arc<dyn AnalyzerFactory>) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::with_options(
            config.discovery.request_timeout(),
            &config.discovery.user_agent,
        )?);
        Ok(Self::new(
            Discoverer::new(fetcher, config.discovery.clone()),
            Dispatcher::new(factory, DispatchConfig::from(config)),
            config.extraction.chunk_size,
        ))
    }

    /// Attach a progress callback to the dispatcher.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChunkProgress) + Send + Sync + 'static,
    {
        self.dispatcher = self.dispatcher.with_progress(callback);
        self
    }

    /// Discover `start_url`, then extract and merge.
    ///
    /// A discovery failure is returned before any chunk is scheduled.
    pub async fn run(
        &self,
        start_url: &str,
        selection: Option<&Selection>,
    ) -> Result<PipelineOutput> {
        let catalog = self.discoverer.discover(start_url).await?;
        self.extract(catalog, selection).await
    }

    /// Extract from an existing catalog.
    pub async fn extract(
        &self,
        catalog: Catalog,
        selection: Option<&Selection>,
    ) -> Result<PipelineOutput> {
        extract(&self.dispatcher, catalog, selection, self.chunk_size).await
    }
}

/// Partition `catalog`, dispatch the chunks and merge the results.
pub async fn extract(
    dispatcher: &Dispatcher,
    catalog: Catalog,
    selection: Option<&Selection>,
    chunk_size: usize,
) -> Result<PipelineOutput> {
    let chunks = partition(&catalog, selection, chunk_size)?;
    let endpoints_selected = chunks.iter().map(crate::Chunk::len).sum();
    info!(
        endpoints = endpoints_selected,
        chunks = chunks.len(),
        "Starting extraction"
    );

    let report = dispatcher.dispatch(&chunks).await;
    let merged = merge(&report.results);

    Ok(PipelineOutput {
        catalog,
        endpoints_selected,
        report,
        merged,
    })
}
