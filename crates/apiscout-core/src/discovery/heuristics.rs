//! Link and text heuristics used to build the category tree.
//!
//! ```rust
//! use apiscout_core::discovery::heuristics::{category_name_for, parse_endpoint_signature};
//!
//! let sig = parse_endpoint_signature("GET /users/{id}").unwrap();
//! assert_eq!(sig.method, "GET");
//! assert_eq!(sig.path, "/users/{id}");
//!
//! assert_eq!(
//!     category_name_for("https://docs.example.com/api/v1/user-accounts/list", ""),
//!     "User Accounts"
//! );
//! ```

use crate::fetcher::PageLink;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// HTTP methods recognized in endpoint signatures.
pub const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Path segments that mark documentation sections.
const DOCS_SEGMENTS: &[&str] = &[
    "docs",
    "doc",
    "documentation",
    "api",
    "apis",
    "reference",
    "references",
    "endpoints",
    "resources",
    "rest",
    "guide",
    "guides",
    "developers",
];

/// Segments that introduce endpoint pages (`/reference/<group>/<endpoint>`).
const ENDPOINT_PREFIXES: &[&str] = &["api", "apis", "reference", "endpoints", "rest"];

/// Path segments that indicate non-documentation content.
const NON_DOCS_SEGMENTS: &[&str] = &[
    "blog", "about", "careers", "pricing", "login", "logout", "signup", "sign-up", "signin",
    "sign-in", "register", "assets", "static", "_next", "_nuxt", "cdn-cgi", "feed", "rss",
    "contact", "privacy", "terms", "legal", "jobs", "press", "news", "changelog", "status",
];

/// File extensions that indicate non-documentation content.
const NON_DOCS_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".mjs", ".woff",
    ".woff2", ".ttf", ".pdf", ".zip", ".gz", ".mp4", ".xml", ".yaml", ".yml", ".map",
];

/// Segments skipped when deriving a category label.
const LABEL_SKIP: &[&str] = &["en", "en-us", "latest", "stable", "current", "index", "overview"];

#[allow(clippy::unwrap_used)]
static SIGNATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(GET|POST|PUT|PATCH|DELETE|HEAD|OPTIONS)\s+(?:https?://[^\s/]+)?(/[A-Za-z0-9_{:<~%][A-Za-z0-9_\-./{}:<>~%]*)",
    )
    .unwrap()
});

#[allow(clippy::unwrap_used)]
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^v\d+(\.\d+)*$").unwrap());

/// An HTTP method plus path found in documentation text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointSignature {
    /// Upper-case HTTP method.
    pub method: String,
    /// Path, starting with `/`.
    pub path: String,
}

/// How a discovered link should be treated by the crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// Same-host documentation page worth visiting.
    Navigation,
    /// Link pointing at a single endpoint's documentation.
    Endpoint,
    /// Anything else.
    Ignore,
}

/// Find the first `METHOD /path` signature in `text`.
///
/// Full URLs after the method are reduced to their path; trailing
/// punctuation is stripped.
#[must_use]
pub fn parse_endpoint_signature(text: &str) -> Option<EndpointSignature> {
    let caps = SIGNATURE_RE.captures(text)?;
    let method = caps.get(1)?.as_str().to_string();
    let path = caps
        .get(2)?
        .as_str()
        .trim_end_matches(['.', ',', ';', ':', ')'])
        .to_string();
    if path.is_empty() {
        return None;
    }
    Some(EndpointSignature { method, path })
}

/// Classify a link found on a page crawled from `root`.
#[must_use]
pub fn classify_link(root: &Url, link: &PageLink) -> LinkKind {
    let Ok(url) = Url::parse(&link.href) else {
        return LinkKind::Ignore;
    };
    if !matches!(url.scheme(), "http" | "https") || url.host_str() != root.host_str() {
        return LinkKind::Ignore;
    }
    if url.path().trim_end_matches('/') == root.path().trim_end_matches('/')
        && url.query().is_none()
    {
        return LinkKind::Ignore;
    }

    let path = url.path().to_lowercase();
    if NON_DOCS_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return LinkKind::Ignore;
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| NON_DOCS_SEGMENTS.contains(s)) {
        return LinkKind::Ignore;
    }

    if parse_endpoint_signature(&link.text).is_some() || is_endpoint_leaf(&segments) {
        return LinkKind::Endpoint;
    }

    let root_path = root.path().trim_end_matches('/').to_lowercase();
    let under_root = !root_path.is_empty() && path.starts_with(&root_path);
    if under_root || segments.iter().any(|s| DOCS_SEGMENTS.contains(s)) {
        LinkKind::Navigation
    } else {
        LinkKind::Ignore
    }
}

/// `true` for `/<prefix>/<group>/<endpoint>` style paths.
fn is_endpoint_leaf(segments: &[&str]) -> bool {
    segments
        .iter()
        .position(|s| ENDPOINT_PREFIXES.contains(s))
        .is_some_and(|pos| {
            segments[pos + 1..]
                .iter()
                .filter(|s| !VERSION_RE.is_match(s))
                .count()
                >= 2
        })
}

/// Derive a category label for a link.
///
/// Uses the first meaningful path segment after any docs prefix, version or
/// locale segment, humanized (`user-accounts` → `User Accounts`). Falls back
/// to the link text, then to `General`.
#[must_use]
pub fn category_name_for(url: &str, link_text: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|u| {
        u.path_segments()?
            .map(str::to_lowercase)
            .find(|s| {
                !s.is_empty()
                    && !DOCS_SEGMENTS.contains(&s.as_str())
                    && !LABEL_SKIP.contains(&s.as_str())
                    && !VERSION_RE.is_match(s)
            })
    });

    if let Some(segment) = segment {
        let label = humanize(segment.split('.').next().unwrap_or(&segment));
        if !label.is_empty() {
            return label;
        }
    }

    let text = link_text.trim();
    if text.is_empty() {
        "General".to_string()
    } else {
        text.to_string()
    }
}

/// Clean up a page title for use as a category name.
///
/// Drops site suffixes such as `Users | Example Docs` or `Users - Example`.
#[must_use]
pub fn category_name_from_title(title: &str) -> String {
    let head = title
        .split(" | ")
        .next()
        .and_then(|t| t.split(" - ").next())
        .and_then(|t| t.split(" — ").next())
        .unwrap_or(title);
    head.trim().to_string()
}

fn humanize(segment: &str) -> String {
    segment
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn link(text: &str, href: &str) -> PageLink {
        PageLink {
            text: text.to_string(),
            href: href.to_string(),
        }
    }

    fn root() -> Url {
        Url::parse("https://docs.example.com/docs/").unwrap()
    }

    #[test]
    fn test_parse_signature_variants() {
        let cases = [
            ("GET /users", Some(("GET", "/users"))),
            ("POST /users/{id}/keys.", Some(("POST", "/users/{id}/keys"))),
            ("Use DELETE /repos/:owner/:repo to remove", Some(("DELETE", "/repos/:owner/:repo"))),
            ("GET https://api.example.com/v1/items?limit=1", Some(("GET", "/v1/items"))),
            ("PATCH\t/orgs/<org>", Some(("PATCH", "/orgs/<org>"))),
            ("get /users", None),
            ("GET /", None),
            ("Fetch users", None),
        ];

        for (text, expected) in cases {
            let parsed = parse_endpoint_signature(text);
            let parsed = parsed.as_ref().map(|s| (s.method.as_str(), s.path.as_str()));
            assert_eq!(parsed, expected, "input: {text}");
        }
    }

    #[test]
    fn test_every_method_recognized() {
        for method in HTTP_METHODS {
            let sig = parse_endpoint_signature(&format!("{method} /things")).unwrap();
            assert_eq!(sig.method, *method);
        }
    }

    #[test]
    fn test_classify_navigation() {
        let r = root();
        assert_eq!(
            classify_link(&r, &link("Users", "https://docs.example.com/docs/users")),
            LinkKind::Navigation
        );
        assert_eq!(
            classify_link(&r, &link("Guide", "https://docs.example.com/guide/intro")),
            LinkKind::Navigation
        );
    }

    #[test]
    fn test_classify_endpoint() {
        let r = root();
        assert_eq!(
            classify_link(&r, &link("GET /users", "https://docs.example.com/docs/users/list")),
            LinkKind::Endpoint
        );
        assert_eq!(
            classify_link(
                &r,
                &link("Get a user", "https://docs.example.com/reference/users/get-user")
            ),
            LinkKind::Endpoint
        );
        assert_eq!(
            classify_link(&r, &link("Users", "https://docs.example.com/api/v1/users")),
            LinkKind::Navigation
        );
    }

    #[test]
    fn test_classify_ignore() {
        let r = root();
        let ignored = [
            link("Other", "https://other.com/docs/users"),
            link("Logo", "https://docs.example.com/docs/logo.png"),
            link("Blog", "https://docs.example.com/blog/launch"),
            link("Login", "https://docs.example.com/login"),
            link("Mail", "mailto:help@example.com"),
            link("Home", "https://docs.example.com/docs/"),
            link("Pricing", "https://docs.example.com/pricing-plans"),
            link("Broken", "not a url"),
        ];
        for l in &ignored {
            assert_eq!(classify_link(&r, l), LinkKind::Ignore, "href: {}", l.href);
        }
    }

    #[test]
    fn test_category_name_for() {
        assert_eq!(category_name_for("https://x.com/docs/users/list", ""), "Users");
        assert_eq!(category_name_for("https://x.com/reference/v2/git_refs", ""), "Git Refs");
        assert_eq!(category_name_for("https://x.com/en/latest/api/billing.html", ""), "Billing");
        assert_eq!(category_name_for("https://x.com/docs/", "Webhooks"), "Webhooks");
        assert_eq!(category_name_for("https://x.com/", ""), "General");
    }

    #[test]
    fn test_category_name_from_title() {
        assert_eq!(category_name_from_title("Users | Example Docs"), "Users");
        assert_eq!(category_name_from_title("Repositories - GitHub API"), "Repositories");
        assert_eq!(category_name_from_title("  Plain  "), "Plain");
    }
}
