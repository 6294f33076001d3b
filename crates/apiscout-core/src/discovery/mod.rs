//! Documentation discovery: crawl an API docs site and build a [`Catalog`].
//!
//! Discovery starts at a root page, follows same-host navigation links
//! breadth-first (bounded by depth and page count) and collects endpoints
//! from two places:
//!
//! 1. `METHOD /path` signatures in page text and headings, filed under the
//!    page's title.
//! 2. Links that point at individual endpoint pages, filed under a label
//!    derived from the link's path.
//!
//! The root page is mandatory: if it cannot be fetched, discovery fails with
//! [`Error::Discovery`] and nothing downstream runs. Child pages that fail
//! are logged and skipped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use apiscout_core::{Discoverer, HttpFetcher};
//! use apiscout_core::config::DiscoveryConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> apiscout_core::Result<()> {
//! let discoverer = Discoverer::new(Arc::new(HttpFetcher::new()?), DiscoveryConfig::default());
//! let catalog = discoverer.discover("https://docs.example.com/api/").await?;
//!
//! for category in &catalog.categories {
//!     println!("{} ({} endpoints)", category.name, category.endpoints.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod heuristics;

use crate::config::DiscoveryConfig;
use crate::fetcher::{FetchedPage, PageFetcher};
use crate::{Catalog, Category, EndpointRef, Error, Result};
use futures::future::join_all;
use heuristics::{
    LinkKind, category_name_for, category_name_from_title, classify_link, parse_endpoint_signature,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use heuristics::EndpointSignature;

const DESCRIPTION_LIMIT: usize = 200;

/// Crawls a documentation site into a [`Catalog`].
pub struct Discoverer {
    fetcher: Arc<dyn PageFetcher>,
    config: DiscoveryConfig,
}

impl std::fmt::Debug for Discoverer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discoverer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Discoverer {
    /// Create a discoverer.
    #[must_use]
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: DiscoveryConfig) -> Self {
        Self { fetcher, config }
    }

    /// Discovery settings in use.
    #[must_use]
    pub const fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Crawl from `start_url` and build the catalog.
    ///
    /// The result is deterministic for a given site and configuration: pages
    /// are processed level by level in link order, and the first occurrence
    /// of an endpoint path wins.
    #[instrument(skip_all, fields(url = %start_url))]
    pub async fn discover(&self, start_url: &str) -> Result<Catalog> {
        let root = Url::parse(start_url)
            .map_err(|e| Error::InvalidUrl(format!("{start_url}: {e}")))?;
        if !matches!(root.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "{start_url}: only http and https are supported"
            )));
        }

        let root_page = self
            .fetcher
            .fetch_page(root.as_str())
            .await
            .map_err(|e| Error::Discovery {
                url: start_url.to_string(),
                reason: e.to_string(),
            })?;

        let mut builder = CatalogBuilder::new(self.config.query.as_deref());
        let mut visited: HashSet<String> = HashSet::from([normalize(root.as_str())]);
        let mut level = vec![root_page];
        let mut depth = 0;

        while !level.is_empty() {
            let mut next_urls = Vec::new();
            for page in &level {
                let navigation = Self::collect_page(&root, page, &mut builder);
                if depth >= self.config.max_depth {
                    continue;
                }
                for url in navigation {
                    if visited.len() >= self.config.max_pages {
                        break;
                    }
                    if visited.insert(normalize(&url)) {
                        next_urls.push(url);
                    }
                }
            }

            if next_urls.is_empty() {
                break;
            }
            depth += 1;
            debug!(depth, pages = next_urls.len(), "Fetching next crawl level");

            let fetched = join_all(next_urls.iter().map(|url| self.fetcher.fetch_page(url))).await;
            level = next_urls
                .iter()
                .zip(fetched)
                .filter_map(|(url, result)| match result {
                    Ok(page) => Some(page),
                    Err(e) => {
                        warn!(url = %url, error = %e, "Skipping page that failed to load");
                        None
                    },
                })
                .collect();
        }

        let catalog = builder.finish(start_url);
        info!(
            categories = catalog.categories.len(),
            endpoints = catalog.endpoint_count(),
            pages = visited.len(),
            "Discovery complete"
        );
        Ok(catalog)
    }

    /// Record a page's endpoints and return its navigation links in order.
    fn collect_page(root: &Url, page: &FetchedPage, builder: &mut CatalogBuilder) -> Vec<String> {
        if builder.title.is_none() {
            builder.title.clone_from(&page.title);
        }

        let page_category = page
            .title
            .as_deref()
            .map(category_name_from_title)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| category_name_for(&page.url, ""));
        let description = page_description(page);

        for line in page.lines() {
            if let Some(sig) = parse_endpoint_signature(line) {
                let title = truncate(line, 120);
                builder.add(
                    &page_category,
                    &description,
                    EndpointRef::new(title, sig.path, page.url.clone()).with_method(sig.method),
                );
            }
        }

        let mut navigation = Vec::new();
        for link in &page.links {
            match classify_link(root, link) {
                LinkKind::Endpoint => {
                    let (method, path) = parse_endpoint_signature(&link.text).map_or_else(
                        || {
                            let path = Url::parse(&link.href)
                                .map_or_else(|_| link.href.clone(), |u| u.path().to_string());
                            (String::new(), path)
                        },
                        |sig| (sig.method, sig.path),
                    );
                    let title = if link.text.is_empty() {
                        path.clone()
                    } else {
                        link.text.clone()
                    };
                    builder.add(
                        &category_name_for(&link.href, &link.text),
                        "",
                        EndpointRef::new(title, path, link.href.clone()).with_method(method),
                    );
                },
                LinkKind::Navigation => navigation.push(link.href.clone()),
                LinkKind::Ignore => {},
            }
        }
        debug!(
            url = %page.url,
            links = page.links.len(),
            navigation = navigation.len(),
            "Processed page"
        );
        navigation
    }
}

struct CatalogBuilder {
    title: Option<String>,
    categories: Vec<Category>,
    seen: HashSet<(String, String)>,
    query: Option<String>,
}

impl CatalogBuilder {
    fn new(query: Option<&str>) -> Self {
        Self {
            title: None,
            categories: Vec::new(),
            seen: HashSet::new(),
            query: query.map(str::to_lowercase).filter(|q| !q.trim().is_empty()),
        }
    }

    fn add(&mut self, category: &str, description: &str, endpoint: EndpointRef) {
        if let Some(query) = &self.query {
            let matches = endpoint.title.to_lowercase().contains(query)
                || endpoint.path.to_lowercase().contains(query);
            if !matches {
                return;
            }
        }
        if !self.seen.insert((endpoint.method.clone(), endpoint.path.clone())) {
            return;
        }

        if let Some(existing) = self.categories.iter_mut().find(|c| c.name == category) {
            if existing.description.is_empty() {
                existing.description = description.to_string();
            }
            existing.endpoints.push(endpoint);
        } else {
            self.categories
                .push(Category::new(category, description).with_endpoint(endpoint));
        }
    }

    fn finish(mut self, source_url: &str) -> Catalog {
        self.categories.retain(|c| !c.endpoints.is_empty());
        Catalog {
            source_url: source_url.to_string(),
            title: self.title,
            categories: self.categories,
        }
    }
}

/// First prose-looking line of the page: not a heading, not a signature,
/// at least three words. Trimmed to 200 characters.
fn page_description(page: &FetchedPage) -> String {
    page.lines()
        .find(|line| {
            line.split_whitespace().count() >= 3
                && !page.headings.iter().any(|h| h.text == *line)
                && parse_endpoint_signature(line).is_none()
        })
        .map(|line| truncate(line, DESCRIPTION_LIMIT))
        .unwrap_or_default()
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        text.chars().take(limit).collect()
    }
}

fn normalize(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::fetcher::{HttpFetcher, PageHeading, PageLink};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    /// In-memory site keyed by URL; records every fetch.
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, FetchedPage>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeSite {
        fn page(mut self, url: &str, title: &str, text: &str, links: &[(&str, &str)]) -> Self {
            let headings = text
                .lines()
                .filter_map(|l| l.strip_prefix("# "))
                .map(|t| PageHeading {
                    level: 2,
                    text: t.to_string(),
                })
                .collect();
            self.pages.insert(
                url.to_string(),
                FetchedPage {
                    url: url.to_string(),
                    title: Some(title.to_string()),
                    text: text.replace("# ", ""),
                    links: links
                        .iter()
                        .map(|(t, h)| PageLink {
                            text: (*t).to_string(),
                            href: (*h).to_string(),
                        })
                        .collect(),
                    headings,
                },
            );
            self
        }
    }

    #[async_trait]
    impl PageFetcher for FakeSite {
        async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
            self.fetched.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| Error::NotFound(url.to_string()))
        }
    }

    const ROOT: &str = "https://docs.example.com/docs/";

    fn site() -> FakeSite {
        FakeSite::default()
            .page(
                ROOT,
                "Example API | Docs",
                "Welcome to the Example API reference.",
                &[
                    ("Users", "https://docs.example.com/docs/users"),
                    ("Repos", "https://docs.example.com/docs/repos"),
                    ("Missing", "https://docs.example.com/docs/gone"),
                    ("Blog", "https://docs.example.com/blog/post"),
                    ("External", "https://other.com/docs/x"),
                ],
            )
            .page(
                "https://docs.example.com/docs/users",
                "Users | Example",
                "# Users\nManage user accounts and their profiles.\n# GET /users\nList users.\n\
                 # GET /users/{id}\nPOST /users creates a user",
                &[
                    ("Deep", "https://docs.example.com/docs/users/deep"),
                    ("Get a key", "https://docs.example.com/reference/keys/get-key"),
                ],
            )
            .page(
                "https://docs.example.com/docs/repos",
                "Repos",
                "Repositories belong to users.\nGET /repos\nGET /users duplicated here",
                &[],
            )
            .page(
                "https://docs.example.com/docs/users/deep",
                "Deep",
                "GET /deep/endpoint",
                &[],
            )
    }

    fn discoverer(site: FakeSite, config: DiscoveryConfig) -> (Discoverer, Arc<FakeSite>) {
        let site = Arc::new(site);
        (Discoverer::new(site.clone(), config), site)
    }

    #[tokio::test]
    async fn test_discover_builds_catalog_in_discovery_order() {
        let (d, _) = discoverer(site(), DiscoveryConfig::default());
        let catalog = d.discover(ROOT).await.unwrap();

        assert_eq!(catalog.source_url, ROOT);
        assert_eq!(catalog.title.as_deref(), Some("Example API | Docs"));

        let names: Vec<&str> = catalog.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Users", "Keys", "Repos"]);

        let users = &catalog.categories[0];
        assert_eq!(users.description, "Manage user accounts and their profiles.");
        let ops: Vec<(&str, &str)> = users
            .endpoints
            .iter()
            .map(|e| (e.method.as_str(), e.path.as_str()))
            .collect();
        assert_eq!(ops, vec![("GET", "/users"), ("GET", "/users/{id}"), ("POST", "/users")]);
        assert_eq!(users.endpoints[0].url, "https://docs.example.com/docs/users");
        assert_eq!(users.endpoints[2].title, "POST /users creates a user");

        assert_eq!(catalog.categories[1].endpoints[0].path, "/reference/keys/get-key");
        assert_eq!(catalog.categories[1].endpoints[0].title, "Get a key");
        assert_eq!(catalog.categories[1].endpoints[0].method, "");

        let repos = &catalog.categories[2];
        assert_eq!(repos.endpoints.len(), 1, "duplicate GET /users must not reappear");
        assert_eq!(repos.description, "Repositories belong to users.");
    }

    #[tokio::test]
    async fn test_same_path_with_different_methods_kept() {
        let site = FakeSite::default().page(
            ROOT,
            "Pets",
            "GET /pets\nPOST /pets\nDELETE /pets/{id}\nGET /pets/{id}\nGET /pets again",
            &[],
        );
        let (d, _) = discoverer(site, DiscoveryConfig::default());
        let catalog = d.discover(ROOT).await.unwrap();

        let kept: Vec<&str> = catalog.categories[0]
            .endpoints
            .iter()
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(kept, vec!["GET /pets", "POST /pets", "DELETE /pets/{id}", "GET /pets/{id}"]);
        assert_eq!(catalog.categories[0].endpoints[3].method, "GET");
    }

    #[tokio::test]
    async fn test_depth_bound_and_failed_children() {
        let (d, site) = discoverer(site(), DiscoveryConfig::default());
        let catalog = d.discover(ROOT).await.unwrap();

        let fetched = site.fetched.lock().unwrap().clone();
        assert!(fetched.contains(&"https://docs.example.com/docs/gone".to_string()));
        assert!(!fetched.iter().any(|u| u.ends_with("/deep")));
        assert!(!fetched.iter().any(|u| u.contains("blog") || u.contains("other.com")));
        assert!(catalog.categories.iter().all(|c| c.name != "Deep"));
    }

    #[tokio::test]
    async fn test_deeper_crawl_reaches_nested_pages() {
        let config = DiscoveryConfig {
            max_depth: 2,
            ..DiscoveryConfig::default()
        };
        let (d, _) = discoverer(site(), config);
        let catalog = d.discover(ROOT).await.unwrap();
        assert!(catalog.categories.iter().any(|c| c.name == "Deep"));
    }

    #[tokio::test]
    async fn test_max_pages_bound() {
        let config = DiscoveryConfig {
            max_pages: 2,
            ..DiscoveryConfig::default()
        };
        let (d, site) = discoverer(site(), config);
        d.discover(ROOT).await.unwrap();
        assert_eq!(site.fetched.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_query_filters_endpoints() {
        let config = DiscoveryConfig {
            query: Some("REPOS".into()),
            ..DiscoveryConfig::default()
        };
        let (d, _) = discoverer(site(), config);
        let catalog = d.discover(ROOT).await.unwrap();

        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.categories[0].name, "Repos");
        assert_eq!(catalog.endpoint_count(), 1);
    }

    #[tokio::test]
    async fn test_discovery_is_idempotent() {
        let (d, _) = discoverer(site(), DiscoveryConfig::default());
        let first = d.discover(ROOT).await.unwrap();
        let second = d.discover(ROOT).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_root_failure_is_hard_error() {
        let (d, _) = discoverer(FakeSite::default(), DiscoveryConfig::default());
        match d.discover(ROOT).await {
            Err(Error::Discovery { url, reason }) => {
                assert_eq!(url, ROOT);
                assert!(reason.contains("Not found"));
            },
            other => panic!("expected discovery error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_start_url() {
        let (d, site) = discoverer(FakeSite::default(), DiscoveryConfig::default());
        assert!(matches!(d.discover("not a url").await, Err(Error::InvalidUrl(_))));
        assert!(matches!(d.discover("ftp://example.com/").await, Err(Error::InvalidUrl(_))));
        assert!(site.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discover_over_http() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><head><title>Petstore</title></head><body>
                   <p>The Petstore API manages pets.</p>
                   <a href="/docs/pets">Pets</a>
                   <a href="/docs/broken">Broken</a></body></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/pets"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r"<html><head><title>Pets</title></head><body>
                   <p>Everything about your pets.</p>
                   <h3>GET /pets</h3><h3>POST /pets</h3><h3>GET /pets/{petId}</h3>
                   </body></html>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let d = Discoverer::new(Arc::new(HttpFetcher::new()?), DiscoveryConfig::default());
        let catalog = d.discover(&format!("{}/docs/", server.uri())).await?;

        assert_eq!(catalog.title.as_deref(), Some("Petstore"));
        assert_eq!(catalog.categories.len(), 1);
        let pets = &catalog.categories[0];
        assert_eq!(pets.name, "Pets");
        assert_eq!(pets.description, "Everything about your pets.");
        let ops: Vec<(&str, &str)> = pets
            .endpoints
            .iter()
            .map(|e| (e.method.as_str(), e.path.as_str()))
            .collect();
        assert_eq!(ops, vec![("GET", "/pets"), ("POST", "/pets"), ("GET", "/pets/{petId}")]);
        Ok(())
    }

    #[tokio::test]
    async fn test_root_http_404_is_hard_error() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let d = Discoverer::new(Arc::new(HttpFetcher::new()?), DiscoveryConfig::default());
        let result = d.discover(&format!("{}/docs/", server.uri())).await;
        assert!(matches!(result, Err(Error::Discovery { .. })));
        Ok(())
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "é".repeat(300);
        assert_eq!(truncate(&text, DESCRIPTION_LIMIT).chars().count(), 200);
        assert_eq!(truncate("short", DESCRIPTION_LIMIT), "short");
    }
}
