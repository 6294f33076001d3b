//! Folds per-chunk results back into per-category endpoint lists.
//!
//! The merger only knows category *names*: each extracted endpoint carries
//! its own category label and each [`ChunkResult`] lists the categories its
//! chunk covered (with their catalog index). Buckets are keyed by name and
//! emitted in ascending catalog index, so the output is identical however the
//! dispatcher's workers happened to finish.

use crate::{ChunkResult, MergedCategory, MergedOutput};
use std::collections::HashMap;
use tracing::{debug, warn};

struct Bucket {
    index: Option<usize>,
    first_seen: usize,
    description: String,
    endpoints: Vec<crate::ExtractedEndpoint>,
}

impl Bucket {
    fn offer_description(&mut self, description: &str) {
        if self.description.is_empty() && !description.trim().is_empty() {
            self.description = description.trim().to_string();
        }
    }
}

#[derive(Default)]
struct Buckets {
    by_name: HashMap<String, Bucket>,
}

impl Buckets {
    fn entry(&mut self, name: &str, index: Option<usize>) -> &mut Bucket {
        let first_seen = self.by_name.len();
        let bucket = self
            .by_name
            .entry(name.to_string())
            .or_insert_with(|| Bucket {
                index,
                first_seen,
                description: String::new(),
                endpoints: Vec::new(),
            });
        if let (None, Some(index)) = (bucket.index, index) {
            bucket.index = Some(index);
        }
        bucket
    }
}

/// Merge chunk results into a category-ordered [`MergedOutput`].
///
/// - Results are visited in `chunk_id` order, so endpoints within a category
///   keep catalog order regardless of the order `results` arrives in.
/// - Failed chunks contribute no endpoints but still create buckets for the
///   categories they covered.
/// - A category's description is the first non-empty one seen and is never
///   overwritten.
/// - Endpoints labelled with a category that no chunk covered get a
///   best-effort bucket placed after all known categories.
///
/// The function is pure; merging the same input twice yields equal output.
///
/// ```rust
/// use apiscout_core::{merge, ChunkResult, CoveredCategory, ChunkExtraction};
///
/// let failed = ChunkResult {
///     chunk_id: 1,
///     endpoints_processed: 0,
///     covered: vec![CoveredCategory {
///         name: "Repos".into(),
///         index: 1,
///         description: String::new(),
///     }],
///     data: ChunkExtraction::default(),
///     error: Some("timeout".into()),
/// };
/// let merged = merge(&[failed]);
/// assert_eq!(merged.categories.len(), 1);
/// assert!(merged.categories[0].endpoints.is_empty());
/// ```
pub fn merge(results: &[ChunkResult]) -> MergedOutput {
    let mut ordered: Vec<&ChunkResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.chunk_id);

    let mut buckets = Buckets::default();
    let mut unknown = 0usize;

    for result in ordered {
        for covered in &result.covered {
            buckets
                .entry(&covered.name, Some(covered.index))
                .offer_description(&covered.description);
        }

        if !result.is_success() {
            continue;
        }

        for endpoint in &result.data.endpoints {
            let known = result.covered.iter().any(|c| c.name == endpoint.category)
                || buckets
                    .by_name
                    .get(&endpoint.category)
                    .is_some_and(|b| b.index.is_some());
            if !known {
                unknown += 1;
                warn!(
                    chunk_id = result.chunk_id,
                    category = %endpoint.category,
                    path = %endpoint.path,
                    "Extracted endpoint names a category outside its chunk; using a trailing bucket"
                );
            }
            let bucket = buckets.entry(&endpoint.category, None);
            bucket.offer_description(&endpoint.category_description);
            bucket.endpoints.push(endpoint.clone());
        }
    }

    let mut categories: Vec<(String, Bucket)> = buckets.by_name.into_iter().collect();
    categories.sort_by_key(|(_, b)| (b.index.is_none(), b.index, b.first_seen));

    let output = MergedOutput {
        categories: categories
            .into_iter()
            .map(|(name, bucket)| MergedCategory {
                name,
                description: bucket.description,
                endpoints: bucket.endpoints,
            })
            .collect(),
    };
    debug!(
        categories = output.categories.len(),
        endpoints = output.endpoint_count(),
        unknown,
        "Merged chunk results"
    );
    output
}
