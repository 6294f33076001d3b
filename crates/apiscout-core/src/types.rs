//! Core records flowing through the extraction pipeline.
//!
//! Discovery produces a [`Catalog`], the partitioner turns it into
//! [`Chunk`]s, the dispatcher turns each chunk into exactly one
//! [`ChunkResult`], and the merger folds those back into a
//! [`MergedOutput`]. Every record is built once by the component that owns
//! it and is read-only afterwards.

use serde::{Deserialize, Serialize};
use url::Url;

/// A reference to a documented endpoint, as found during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRef {
    /// Human-readable title (link text or heading).
    pub title: String,
    /// Endpoint path, e.g. `/users/{id}`.
    pub path: String,
    /// Upper-case HTTP method when the documentation names one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    /// Absolute URL of the page documenting this endpoint.
    pub url: String,
}

impl EndpointRef {
    /// Create an endpoint reference with an explicit URL.
    #[must_use]
    pub fn new(title: impl Into<String>, path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            method: String::new(),
            url: url.into(),
        }
    }

    /// Create an endpoint reference whose URL is derived from `base` and `path`.
    ///
    /// Falls back to the base URL itself when the path cannot be joined
    /// (for example a templated path containing characters `Url` rejects).
    #[must_use]
    pub fn with_base(title: impl Into<String>, path: impl Into<String>, base: &Url) -> Self {
        let path = path.into();
        let url = base
            .join(&path)
            .map_or_else(|_| base.to_string(), |u| u.to_string());
        Self {
            title: title.into(),
            path,
            method: String::new(),
            url,
        }
    }

    /// Attach the HTTP method the documentation pairs with this path.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }
}

/// A named group of endpoints, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Category name; the join key used by the merger.
    pub name: String,
    /// Short description taken from the documentation page.
    #[serde(default)]
    pub description: String,
    /// Endpoints in the order they were discovered.
    #[serde(default)]
    pub endpoints: Vec<EndpointRef>,
}

impl Category {
    /// Create an empty category.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            endpoints: Vec::new(),
        }
    }

    /// Append an endpoint using builder style.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: EndpointRef) -> Self {
        self.endpoints.push(endpoint);
        self
    }
}

/// The full category → endpoint tree produced by discovery.
///
/// Category order is meaningful: it is the order categories were first
/// discovered and is preserved all the way through the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// URL discovery started from.
    #[serde(default)]
    pub source_url: String,
    /// Title of the root documentation page.
    #[serde(default)]
    pub title: Option<String>,
    /// Categories in discovery order.
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Create a catalog from categories.
    #[must_use]
    pub fn new(source_url: impl Into<String>, categories: Vec<Category>) -> Self {
        Self {
            source_url: source_url.into(),
            title: None,
            categories,
        }
    }

    /// Total number of endpoints across every category.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.categories.iter().map(|c| c.endpoints.len()).sum()
    }

    /// Index of the category with the given name, if present.
    #[must_use]
    pub fn category_index(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    /// Returns `true` when no category holds any endpoint.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoint_count() == 0
    }
}

/// One endpoint scheduled for extraction, tagged with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkEntry {
    /// Name of the category the endpoint belongs to.
    pub category: String,
    /// Index of that category in the catalog.
    pub category_index: usize,
    /// Description of the category, carried so the merger can label buckets.
    #[serde(default)]
    pub category_description: String,
    /// The endpoint itself.
    pub endpoint: EndpointRef,
}

/// A category touched by a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoveredCategory {
    /// Category name.
    pub name: String,
    /// Catalog index of the category.
    pub index: usize,
    /// Category description from discovery (may be empty).
    #[serde(default)]
    pub description: String,
}

/// A bounded, sequentially numbered unit of extraction work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// 1-based id, unique within a run.
    pub chunk_id: usize,
    /// Endpoints in catalog order; may span several categories.
    pub entries: Vec<ChunkEntry>,
    /// Total number of chunks in the run (identical on every chunk).
    pub total_chunks: usize,
}

impl Chunk {
    /// Number of endpoints in this chunk.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the chunk holds no endpoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct categories touched by this chunk, in entry order.
    #[must_use]
    pub fn covered_categories(&self) -> Vec<CoveredCategory> {
        let mut covered: Vec<CoveredCategory> = Vec::new();
        for entry in &self.entries {
            if !covered.iter().any(|c| c.name == entry.category) {
                covered.push(CoveredCategory {
                    name: entry.category.clone(),
                    index: entry.category_index,
                    description: entry.category_description.clone(),
                });
            }
        }
        covered
    }
}

/// Where an API parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    /// Templated path segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Request body field.
    Body,
    /// Cookie.
    Cookie,
    /// Not stated by the documentation.
    #[default]
    #[serde(other)]
    Unknown,
}

/// A single request parameter described by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is sent.
    #[serde(default, rename = "in")]
    pub location: ParameterLocation,
    /// Declared type, e.g. `string` or `integer`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Whether the parameter is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

/// An endpoint enriched by the content analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEndpoint {
    /// Category name the endpoint belongs to.
    #[serde(default)]
    pub category: String,
    /// Category description as reported by the analyzer (may be empty).
    #[serde(default)]
    pub category_description: String,
    /// HTTP method in upper case.
    #[serde(default)]
    pub method: String,
    /// Endpoint path.
    pub path: String,
    /// Endpoint title.
    #[serde(default)]
    pub title: String,
    /// Documentation URL.
    #[serde(default)]
    pub url: String,
    /// What the endpoint does.
    #[serde(default)]
    pub description: String,
    /// Authentication requirements, if documented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    /// Request parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Request body shape, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    /// Response shape, if documented.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    /// Usage examples (curl snippets, code).
    #[serde(default)]
    pub examples: Vec<String>,
}

impl ExtractedEndpoint {
    /// Minimal record for an endpoint in the given category.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            category_description: String::new(),
            method: method.into(),
            path: path.into(),
            title: String::new(),
            url: String::new(),
            description: String::new(),
            auth: None,
            parameters: Vec::new(),
            request_body: None,
            response: None,
            examples: Vec::new(),
        }
    }
}

/// Structured output of one successful analyzer call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkExtraction {
    /// Enriched endpoints, in the order the analyzer returned them.
    #[serde(default)]
    pub endpoints: Vec<ExtractedEndpoint>,
}

impl ChunkExtraction {
    /// Returns `true` when nothing was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// The outcome of dispatching one chunk.
///
/// Exactly one result exists per submitted chunk. A failed chunk carries an
/// `error`, an empty `data` payload and zero `endpoints_processed`, but
/// still lists the categories it covered so the merger keeps their buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResult {
    /// Id of the chunk this result belongs to.
    pub chunk_id: usize,
    /// Number of endpoints the analyzer processed (0 on failure).
    pub endpoints_processed: usize,
    /// Categories the chunk covered.
    pub covered: Vec<CoveredCategory>,
    /// Extraction payload (empty on failure).
    pub data: ChunkExtraction,
    /// Error message when the chunk failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkResult {
    /// Result for a chunk whose analyzer call succeeded.
    #[must_use]
    pub fn success(chunk: &Chunk, data: ChunkExtraction) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            endpoints_processed: chunk.len(),
            covered: chunk.covered_categories(),
            data,
            error: None,
        }
    }

    /// Placeholder result for a chunk that failed.
    #[must_use]
    pub fn failure(chunk: &Chunk, error: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            endpoints_processed: 0,
            covered: chunk.covered_categories(),
            data: ChunkExtraction::default(),
            error: Some(error.into()),
        }
    }

    /// Returns `true` if the chunk was extracted without error.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// One category of the merged output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedCategory {
    /// Category name.
    pub name: String,
    /// First non-empty description seen for the category.
    pub description: String,
    /// Enriched endpoints, in chunk order.
    pub endpoints: Vec<ExtractedEndpoint>,
}

/// Final category-ordered extraction result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedOutput {
    /// Categories in original discovery order.
    pub categories: Vec<MergedCategory>,
}

impl MergedOutput {
    /// Total number of extracted endpoints.
    #[must_use]
    pub fn endpoint_count(&self) -> usize {
        self.categories.iter().map(|c| c.endpoints.len()).sum()
    }

    /// Look up a category by name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&MergedCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}
