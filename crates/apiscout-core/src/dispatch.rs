//! Parallel extraction dispatcher.
//!
//! Fans chunks out to a bounded pool of worker tasks, one analyzer instance
//! per chunk, and gathers exactly one [`ChunkResult`] per submitted chunk.
//!
//! ## Guarantees
//!
//! - At most `min(chunks, max_workers)` analyzer calls run at once.
//! - Each worker slot owns a [`RateLimiter`]: consecutive analyzer calls made
//!   through the same slot are at least `min_call_interval` apart. Slots never
//!   share a timestamp.
//! - A chunk whose analyzer errors, times out or panics yields a failure
//!   placeholder; siblings are unaffected and `dispatch` itself never fails.
//! - Results are collected in completion order, then sorted by `chunk_id`
//!   before they are returned.
//! - The progress callback runs on the coordinating task, once per finished
//!   chunk, and cannot influence scheduling.
//! - Submitted and returned chunk ids are compared after the run; any
//!   discrepancy is logged and reported in [`DispatchReport`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use apiscout_core::{AnthropicAnalyzerFactory, Dispatcher, DispatchConfig};
//! use apiscout_core::config::AnalyzerConfig;
//! use std::sync::Arc;
//!
//! # async fn example(chunks: Vec<apiscout_core::Chunk>) -> apiscout_core::Result<()> {
//! let factory = AnthropicAnalyzerFactory::from_config(AnalyzerConfig::default())?;
//! let dispatcher = Dispatcher::new(Arc::new(factory), DispatchConfig::default())
//!     .with_progress(|p| println!("{}/{} (chunk {})", p.completed, p.total, p.chunk_id));
//!
//! let report = dispatcher.dispatch(&chunks).await;
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```

use crate::analyzer::AnalyzerFactory;
use crate::config::{Config, ExtractionConfig};
use crate::{Chunk, ChunkResult, Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Default upper bound on concurrently running chunk workers.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Progress payload delivered after each chunk completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkProgress {
    /// Chunks finished so far in this pass (including this one).
    pub completed: usize,
    /// Chunks submitted in this pass.
    pub total: usize,
    /// Id of the chunk that just finished.
    pub chunk_id: usize,
    /// Whether the chunk succeeded.
    pub success: bool,
    /// Endpoints the chunk processed.
    pub endpoints_processed: usize,
    /// 1 for the first pass, 2 for the retry pass.
    pub attempt: u32,
}

/// Progress callback type.
pub type ProgressCallback = Arc<dyn Fn(&ChunkProgress) + Send + Sync>;

/// Dispatcher tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on concurrent workers (clamped to at least 1).
    pub max_workers: usize,
    /// Per-chunk time budget; `None` waits indefinitely.
    pub chunk_timeout: Option<Duration>,
    /// Re-run failed chunks once with a fresh analyzer.
    pub retry_failed: bool,
    /// Minimum spacing between analyzer calls on one worker slot.
    pub min_call_interval: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&ExtractionConfig::default())
    }
}

impl From<&ExtractionConfig> for DispatchConfig {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            max_workers: config.max_workers,
            chunk_timeout: config.chunk_timeout(),
            retry_failed: config.retry_failed,
            min_call_interval: Duration::ZERO,
        }
    }
}

impl From<&Config> for DispatchConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_call_interval: config.analyzer.min_call_interval(),
            ..Self::from(&config.extraction)
        }
    }
}

/// Enforces a minimum interval between consecutive calls on one worker slot.
///
/// The first call is never delayed.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval.
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Sleep until the interval since the previous call has elapsed.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        self.last_call = Some(Instant::now());
    }
}

/// Limiters for idle worker slots. A task takes one after acquiring its
/// permit and puts it back when its chunk is done.
type SlotPool = Arc<Mutex<Vec<RateLimiter>>>;

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    /// One result per submitted chunk, sorted by `chunk_id`.
    pub results: Vec<ChunkResult>,
    /// Submitted chunk ids that produced no result (filled with placeholders).
    pub missing_chunks: Vec<usize>,
    /// Result chunk ids that were never submitted (dropped).
    pub unexpected_chunks: Vec<usize>,
    /// Chunk ids re-run by the retry pass.
    pub retried_chunks: Vec<usize>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl DispatchReport {
    /// Number of chunks extracted without error.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of chunks carrying an error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Ids of failed chunks in ascending order.
    #[must_use]
    pub fn failed_chunk_ids(&self) -> Vec<usize> {
        self.results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.chunk_id)
            .collect()
    }

    /// Total endpoints processed by successful chunks.
    #[must_use]
    pub fn endpoints_processed(&self) -> usize {
        self.results.iter().map(|r| r.endpoints_processed).sum()
    }

    /// Returns `true` when the result ids matched the submitted ids exactly.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_chunks.is_empty() && self.unexpected_chunks.is_empty()
    }
}

/// Runs extraction over chunks with a bounded worker pool.
pub struct Dispatcher {
    factory: Arc<dyn AnalyzerFactory>,
    config: DispatchConfig,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(factory: Arc<dyn AnalyzerFactory>, mut config: DispatchConfig) -> Self {
        config.max_workers = config.max_workers.max(1);
        Self {
            factory,
            config,
            progress: None,
        }
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ChunkProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Worker pool size used for `chunk_count` chunks.
    #[must_use]
    pub fn pool_size(&self, chunk_count: usize) -> usize {
        chunk_count.min(self.config.max_workers)
    }

    /// Extract every chunk and return one result per chunk, sorted by id.
    ///
    /// An empty input is a valid "nothing to do" run.
    #[instrument(skip_all, fields(chunks = chunks.len()))]
    pub async fn dispatch(&self, chunks: &[Chunk]) -> DispatchReport {
        let started_at = Utc::now();
        if chunks.is_empty() {
            debug!("No chunks to dispatch");
            return DispatchReport {
                started_at,
                finished_at: Utc::now(),
                ..DispatchReport::default()
            };
        }

        let shared: Vec<Arc<Chunk>> = chunks.iter().cloned().map(Arc::new).collect();
        let slots: SlotPool = Arc::new(Mutex::new(vec![
            RateLimiter::new(self.config.min_call_interval);
            self.pool_size(shared.len())
        ]));
        let mut results = self.run_pass(&shared, &slots, 1).await;

        let mut retried_chunks = Vec::new();
        if self.config.retry_failed {
            let failed: BTreeSet<usize> = results
                .iter()
                .filter(|r| !r.is_success())
                .map(|r| r.chunk_id)
                .collect();
            if !failed.is_empty() {
                info!(count = failed.len(), "Retrying failed chunks once");
                let retry: Vec<Arc<Chunk>> = shared
                    .iter()
                    .filter(|c| failed.contains(&c.chunk_id))
                    .cloned()
                    .collect();
                let rerun = self.run_pass(&retry, &slots, 2).await;
                results.retain(|r| !failed.contains(&r.chunk_id));
                results.extend(rerun);
                retried_chunks = failed.into_iter().collect();
            }
        }

        results.sort_by_key(|r| r.chunk_id);
        let (missing_chunks, unexpected_chunks) = verify_completeness(&shared, &mut results);

        let report = DispatchReport {
            results,
            missing_chunks,
            unexpected_chunks,
            retried_chunks,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Extraction dispatch finished"
        );
        report
    }

    async fn run_pass(
        &self,
        chunks: &[Arc<Chunk>],
        slots: &SlotPool,
        attempt: u32,
    ) -> Vec<ChunkResult> {
        let total = chunks.len();
        let workers = self.pool_size(total);
        debug!(total, workers, attempt, "Starting worker pool");

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut by_task = HashMap::with_capacity(total);

        for chunk in chunks {
            let chunk_for_task = Arc::clone(chunk);
            let factory = Arc::clone(&self.factory);
            let semaphore = Arc::clone(&semaphore);
            let slots = Arc::clone(slots);
            let timeout = self.config.chunk_timeout;
            let interval = self.config.min_call_interval;

            let handle = tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return ChunkResult::failure(&chunk_for_task, "worker pool closed");
                };
                // A slot lost to a panicking task is replaced by a fresh limiter.
                let mut limiter = slots
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop()
                    .unwrap_or_else(|| RateLimiter::new(interval));
                limiter.wait().await;
                let result = run_chunk(factory.as_ref(), &chunk_for_task, timeout).await;
                slots
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(limiter);
                result
            });
            by_task.insert(handle.id(), Arc::clone(chunk));
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(err) => {
                    let Some(chunk) = by_task.get(&err.id()) else {
                        warn!(error = %err, "Worker task ended for an unknown chunk");
                        continue;
                    };
                    let reason = if err.is_panic() {
                        "worker panicked".to_string()
                    } else {
                        format!("worker cancelled: {err}")
                    };
                    warn!(chunk_id = chunk.chunk_id, %reason, "Chunk worker did not complete");
                    ChunkResult::failure(chunk, reason)
                },
            };

            let progress = ChunkProgress {
                completed: results.len() + 1,
                total,
                chunk_id: result.chunk_id,
                success: result.is_success(),
                endpoints_processed: result.endpoints_processed,
                attempt,
            };
            if let Some(callback) = &self.progress {
                callback(&progress);
            }
            results.push(result);
        }

        results
    }
}

async fn run_chunk(
    factory: &dyn AnalyzerFactory,
    chunk: &Chunk,
    timeout: Option<Duration>,
) -> ChunkResult {
    let work = async {
        let mut analyzer = factory.create()?;
        analyzer.analyze(&chunk.entries).await
    };

    let outcome = match timeout {
        Some(limit) => tokio::time::timeout(limit, work).await.unwrap_or_else(|_| {
            Err(Error::Timeout(format!(
                "chunk {} timed out after {:.1}s",
                chunk.chunk_id,
                limit.as_secs_f64()
            )))
        }),
        None => work.await,
    };

    match outcome {
        Ok(data) => {
            debug!(
                chunk_id = chunk.chunk_id,
                extracted = data.endpoints.len(),
                "Chunk extracted"
            );
            ChunkResult::success(chunk, data)
        },
        Err(err) => {
            warn!(
                chunk_id = chunk.chunk_id,
                category = err.category(),
                error = %err,
                "Chunk extraction failed"
            );
            ChunkResult::failure(chunk, err.to_string())
        },
    }
}

/// Compare submitted and returned chunk ids.
///
/// Missing chunks get a failure placeholder so the one-result-per-chunk
/// guarantee holds; results for unknown ids are dropped. Both are logged.
fn verify_completeness(
    submitted: &[Arc<Chunk>],
    results: &mut Vec<ChunkResult>,
) -> (Vec<usize>, Vec<usize>) {
    let expected: BTreeSet<usize> = submitted.iter().map(|c| c.chunk_id).collect();
    let returned: BTreeSet<usize> = results.iter().map(|r| r.chunk_id).collect();

    let missing: Vec<usize> = expected.difference(&returned).copied().collect();
    let unexpected: Vec<usize> = returned.difference(&expected).copied().collect();

    if !missing.is_empty() {
        warn!(?missing, "Data integrity: chunks missing from dispatch results");
        for chunk in submitted.iter().filter(|c| missing.contains(&c.chunk_id)) {
            results.push(ChunkResult::failure(chunk, "no result returned for chunk"));
        }
    }
    if !unexpected.is_empty() {
        warn!(?unexpected, "Data integrity: results for chunks that were never submitted");
        results.retain(|r| !unexpected.contains(&r.chunk_id));
    }
    if !missing.is_empty() || !unexpected.is_empty() {
        results.sort_by_key(|r| r.chunk_id);
    }

    (missing, unexpected)
}
