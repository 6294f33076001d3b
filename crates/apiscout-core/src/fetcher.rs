//! Web fetch adapter: retrieves documentation pages and reduces them to
//! title, text, headings and outbound links.

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Anchor found on a page, with its href resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    /// Visible link text, whitespace-collapsed.
    pub text: String,
    /// Absolute URL without fragment.
    pub href: String,
}

/// A heading (`h1`..`h6`) found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeading {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Heading text.
    pub text: String,
}

/// A fetched and simplified documentation page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Final URL of the page.
    pub url: String,
    /// Page title (`<title>`, falling back to the first `h1`).
    pub title: Option<String>,
    /// Readable text, one block (paragraph, list item, code line, ...) per line.
    pub text: String,
    /// Outbound links in document order.
    pub links: Vec<PageLink>,
    /// Headings in document order.
    pub headings: Vec<PageHeading>,
}

impl FetchedPage {
    /// Iterate over the non-empty text lines of the page.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// Source of documentation pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and simplify the page at `url`.
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage>;
}

/// HTTP-backed [`PageFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the default 30 second timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a fetcher with a custom request timeout (primarily for tests)
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::with_options(timeout, concat!("apiscout/", env!("CARGO_PKG_VERSION")))
    }

    /// Creates a fetcher with an explicit timeout and user agent.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    /// Fetch the raw body of `url`.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            if status == StatusCode::NOT_FOUND {
                return Err(Error::NotFound(format!("Page not found at '{url}'")));
            }
            return Err(Error::Network(
                response
                    .error_for_status()
                    .err()
                    .ok_or_else(|| {
                        Error::Other(format!("Unexpected status {status} for '{url}'"))
                    })?,
            ));
        }

        let content = response.text().await?;
        info!("Fetched {} bytes from {}", content.len(), url);
        Ok(content)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let base = Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
        let body = self.fetch_text(url).await?;
        Ok(parse_html(&base, &body))
    }
}

#[allow(clippy::unwrap_used)]
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
#[allow(clippy::unwrap_used)]
static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
#[allow(clippy::unwrap_used)]
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "pre", "code", "td", "th", "dt", "dd",
    "blockquote",
];
const SKIP_TAGS: &[&str] = &["script", "style", "template", "noscript", "svg"];

/// Reduce an HTML document to a [`FetchedPage`].
///
/// Script and style content is dropped, nested blocks are emitted once
/// (by their outermost block ancestor) and preformatted blocks keep their
/// line structure.
pub fn parse_html(base: &Url, html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    let mut headings = Vec::new();
    let mut lines: Vec<String> = Vec::new();
    let root = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    for element in root.descendent_elements() {
        let tag = element.value().name();
        if !BLOCK_TAGS.contains(&tag) || has_ancestor_in(&element, SKIP_TAGS) {
            continue;
        }
        if let Some(level) = heading_level(tag) {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                headings.push(PageHeading { level, text });
            }
        }
        if has_ancestor_in(&element, BLOCK_TAGS) {
            continue;
        }

        let raw: String = element.text().collect();
        if tag == "pre" {
            lines.extend(raw.lines().map(collapse_whitespace).filter(|l| !l.is_empty()));
        } else {
            let text = collapse_whitespace(&raw);
            if !text.is_empty() {
                lines.push(text);
            }
        }
    }

    let title = document
        .select(&TITLE)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .or_else(|| headings.iter().find(|h| h.level == 1).map(|h| h.text.clone()));

    let links = document
        .select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            if href.is_empty() || href.starts_with('#') {
                return None;
            }
            let mut resolved = base.join(href).ok()?;
            resolved.set_fragment(None);
            Some(PageLink {
                text: collapse_whitespace(&a.text().collect::<String>()),
                href: resolved.to_string(),
            })
        })
        .collect::<Vec<_>>();

    debug!(
        url = %base,
        lines = lines.len(),
        links = links.len(),
        headings = headings.len(),
        "Parsed page"
    );

    FetchedPage {
        url: base.to_string(),
        title,
        text: lines.join("\n"),
        links,
        headings,
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn has_ancestor_in(element: &ElementRef<'_>, tags: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| tags.contains(&a.value().name()))
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::disallowed_macros,
    clippy::match_wildcard_for_single_variants
)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const PAGE: &str = r##"<!doctype html>
<html>
  <head><title> Users API </title><style>.x { color: red }</style></head>
  <body>
    <nav><a href="/docs/repos">Repositories</a></nav>
    <h1>Users</h1>
    <p>Manage   user accounts
       and profiles.</p>
    <h2>GET /users/{id}</h2>
    <ul><li><p>Returns a <code>User</code> object.</p></li></ul>
    <pre>curl https://api.example.com/users/1
  -H "Authorization: Bearer TOKEN"</pre>
    <script>var ignored = "GET /nope";</script>
    <a href="#top">Top</a>
    <a href="create#section">Create user</a>
    <a href="mailto:help@example.com">Email</a>
  </body>
</html>"##;

    #[test]
    fn test_parse_html_extracts_structure() {
        let base = Url::parse("https://docs.example.com/docs/users").unwrap();
        let page = parse_html(&base, PAGE);

        assert_eq!(page.title.as_deref(), Some("Users API"));
        assert_eq!(
            page.headings,
            vec![
                PageHeading {
                    level: 1,
                    text: "Users".into(),
                },
                PageHeading {
                    level: 2,
                    text: "GET /users/{id}".into(),
                },
            ]
        );

        let lines: Vec<&str> = page.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Users",
                "Manage user accounts and profiles.",
                "GET /users/{id}",
                "Returns a User object.",
                "curl https://api.example.com/users/1",
                "-H \"Authorization: Bearer TOKEN\"",
            ]
        );
        assert!(!page.text.contains("ignored"));
        assert!(!page.text.contains("color"));
    }

    #[test]
    fn test_parse_html_resolves_links_and_drops_fragments() {
        let base = Url::parse("https://docs.example.com/docs/users").unwrap();
        let page = parse_html(&base, PAGE);

        let hrefs: Vec<&str> = page.links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "https://docs.example.com/docs/repos",
                "https://docs.example.com/docs/create",
                "mailto:help@example.com",
            ]
        );
        assert_eq!(page.links[1].text, "Create user");
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let base = Url::parse("https://docs.example.com/").unwrap();
        let page = parse_html(&base, "<html><body><h1>Reference</h1></body></html>");
        assert_eq!(page.title.as_deref(), Some("Reference"));
    }

    #[tokio::test]
    async fn test_fetch_page_success() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new()?;
        let page = fetcher
            .fetch_page(&format!("{}/docs", mock_server.uri()))
            .await?;
        assert_eq!(page.title.as_deref(), Some("Users API"));
        assert_eq!(page.headings.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_404_error() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new()?;
        let result = fetcher
            .fetch_page(&format!("{}/missing", mock_server.uri()))
            .await;

        match result {
            Err(Error::NotFound(msg)) => assert!(msg.contains("/missing")),
            other => panic!("Expected NotFound error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_500_error() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new()?;
        let result = fetcher
            .fetch_page(&format!("{}/broken", mock_server.uri()))
            .await;

        match result {
            Err(Error::Network(e)) => {
                assert_eq!(e.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
            },
            other => panic!("Expected Network error, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_timeout() -> anyhow::Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>slow</p>")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(100))?;
        let result = fetcher
            .fetch_page(&format!("{}/slow", mock_server.uri()))
            .await;

        match result {
            Err(err) => assert!(err.is_recoverable(), "timeout should be recoverable: {err}"),
            Ok(_) => panic!("Slow request should time out"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch_page("not a url").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
