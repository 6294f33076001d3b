//! End-to-end checks of partition, dispatch and merge with an in-process analyzer.

#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use apiscout_core::{
    AnalyzerFactory, Catalog, Category, ChunkEntry, ChunkExtraction, ContentAnalyzer,
    DispatchConfig, Dispatcher, EndpointRef, Error, ExtractedEndpoint, MergedOutput, Selection,
    extract,
};
use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Echoes every entry back, failing any chunk that contains a path in `poisoned`.
struct EchoAnalyzer {
    poisoned: Arc<BTreeSet<String>>,
}

#[async_trait]
impl ContentAnalyzer for EchoAnalyzer {
    async fn analyze(&mut self, entries: &[ChunkEntry]) -> apiscout_core::Result<ChunkExtraction> {
        tokio::task::yield_now().await;
        if entries.iter().any(|e| self.poisoned.contains(&e.endpoint.path)) {
            return Err(Error::Analyzer("poisoned chunk".into()));
        }
        Ok(ChunkExtraction {
            endpoints: entries
                .iter()
                .map(|e| ExtractedEndpoint::new(&e.category, "GET", &e.endpoint.path))
                .collect(),
        })
    }
}

fn dispatcher(workers: usize, poisoned: BTreeSet<String>) -> Dispatcher {
    let poisoned = Arc::new(poisoned);
    let factory: Arc<dyn AnalyzerFactory> =
        Arc::new(move || -> apiscout_core::Result<Box<dyn ContentAnalyzer>> {
            Ok(Box::new(EchoAnalyzer {
                poisoned: Arc::clone(&poisoned),
            }))
        });
    Dispatcher::new(
        factory,
        DispatchConfig {
            max_workers: workers,
            chunk_timeout: None,
            retry_failed: false,
            min_call_interval: Duration::ZERO,
        },
    )
}

fn catalog(sizes: &[usize]) -> Catalog {
    let categories = sizes
        .iter()
        .enumerate()
        .map(|(c, &n)| {
            (0..n).fold(Category::new(format!("Cat{c}"), ""), |category, e| {
                let path = format!("/c{c}/e{e}");
                category.with_endpoint(EndpointRef::new(&path, &path, "https://docs.test"))
            })
        })
        .collect();
    Catalog::new("https://docs.test", categories)
}

fn flatten(catalog: &Catalog) -> Vec<(String, String)> {
    catalog
        .categories
        .iter()
        .flat_map(|c| c.endpoints.iter().map(move |e| (c.name.clone(), e.path.clone())))
        .collect()
}

fn paths<'a>(merged: &'a MergedOutput, category: &str) -> Vec<&'a str> {
    merged
        .category(category)
        .unwrap()
        .endpoints
        .iter()
        .map(|e| e.path.as_str())
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

#[tokio::test]
async fn failed_chunk_only_loses_its_own_endpoints() {
    // 12 endpoints, chunks of 5: [0..5) [5..10) [10..12)
    let catalog = catalog(&[7, 5]);
    let poisoned = BTreeSet::from(["/c1/e1".to_string()]);

    let output = extract(&dispatcher(3, poisoned), catalog, None, 5).await.unwrap();

    assert_eq!(output.report.results.len(), 3);
    assert_eq!(output.report.failed_chunk_ids(), vec![2]);
    assert!(output.is_partial());

    assert_eq!(
        paths(&output.merged, "Cat0"),
        vec!["/c0/e0", "/c0/e1", "/c0/e2", "/c0/e3", "/c0/e4"]
    );
    assert_eq!(paths(&output.merged, "Cat1"), vec!["/c1/e3", "/c1/e4"]);
}

#[tokio::test]
async fn selection_limits_what_reaches_the_analyzer() {
    let catalog = catalog(&[3, 3]);
    let selection = Selection::new().with("Cat1", "/c1/e2").with("Cat0", "/c0/e0");

    let output = extract(&dispatcher(2, BTreeSet::new()), catalog, Some(&selection), 5)
        .await
        .unwrap();

    assert_eq!(output.endpoints_selected, 2);
    assert_eq!(output.report.results.len(), 1);
    let names: Vec<&str> = output.merged.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Cat0", "Cat1"]);
    assert!(!output.is_partial());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn merged_output_preserves_catalog_order(
        sizes in prop::collection::vec(0usize..8, 1..6),
        chunk_size in 1usize..7,
        workers in 1usize..6,
    ) {
        let catalog = catalog(&sizes);
        let expected = flatten(&catalog);

        let output = runtime()
            .block_on(extract(&dispatcher(workers, BTreeSet::new()), catalog, None, chunk_size))
            .unwrap();

        let chunk_ids: Vec<usize> = output.report.results.iter().map(|r| r.chunk_id).collect();
        let expected_ids: Vec<usize> = (1..=expected.len().div_ceil(chunk_size)).collect();
        prop_assert_eq!(chunk_ids, expected_ids);

        let merged: Vec<(String, String)> = output
            .merged
            .categories
            .iter()
            .flat_map(|c| c.endpoints.iter().map(move |e| (c.name.clone(), e.path.clone())))
            .collect();
        prop_assert_eq!(merged, expected);
    }

    #[test]
    fn failures_never_leak_into_other_chunks(
        sizes in prop::collection::vec(1usize..6, 1..5),
        chunk_size in 1usize..5,
        poison_at in any::<prop::sample::Index>(),
    ) {
        let catalog = catalog(&sizes);
        let all = flatten(&catalog);
        let poisoned_index = poison_at.index(all.len());
        let poisoned = BTreeSet::from([all[poisoned_index].1.clone()]);
        let lost_chunk = poisoned_index / chunk_size;

        let output = runtime()
            .block_on(extract(&dispatcher(3, poisoned), catalog, None, chunk_size))
            .unwrap();

        prop_assert_eq!(output.report.failed_chunk_ids(), vec![lost_chunk + 1]);
        let survivors: Vec<(String, String)> = all
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i / chunk_size != lost_chunk)
            .map(|(_, pair)| pair)
            .collect();
        let merged: Vec<(String, String)> = output
            .merged
            .categories
            .iter()
            .flat_map(|c| c.endpoints.iter().map(move |e| (c.name.clone(), e.path.clone())))
            .collect();
        prop_assert_eq!(merged, survivors);
    }
}
