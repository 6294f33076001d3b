//! Splitting a catalog into fixed-size extraction chunks.
//!
//! Categories are walked in catalog order and endpoints in discovery order.
//! Endpoints accumulate in a running buffer that is sealed into a [`Chunk`]
//! every time it reaches `chunk_size`; whatever remains at the end becomes a
//! final, shorter chunk. Because the chunk count is only known after the
//! walk, `total_chunks` is filled in by a second pass.
//!
//! A chunk may straddle a category boundary. Each [`ChunkEntry`] carries its
//! own category name and index, which is what the merger relies on.
//!
//! ```rust
//! use apiscout_core::{Catalog, Category, EndpointRef, partition};
//!
//! let users = (b'A'..=b'G').fold(Category::new("Users", ""), |c, l| {
//!     let p = format!("/{}", l as char);
//!     c.with_endpoint(EndpointRef::new(p.clone(), p, "https://x"))
//! });
//! let repos = Category::new("Repos", "")
//!     .with_endpoint(EndpointRef::new("H", "/H", "https://x"))
//!     .with_endpoint(EndpointRef::new("I", "/I", "https://x"));
//! let catalog = Catalog::new("https://x", vec![users, repos]);
//!
//! let chunks = partition(&catalog, None, 5)?;
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].len(), 5);
//! assert_eq!(chunks[1].len(), 4);
//! assert!(chunks.iter().all(|c| c.total_chunks == 2));
//! # Ok::<(), apiscout_core::Error>(())
//! ```

use crate::{Catalog, Chunk, ChunkEntry, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Default number of endpoints per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// A curated subset of the catalog: category name → endpoint paths.
///
/// Stored as JSON, e.g. `{"Users": ["/users", "/users/{id}"]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<String, BTreeSet<String>>);

impl Selection {
    /// Create an empty selection (selects nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an endpoint path within a category.
    #[must_use]
    pub fn with(mut self, category: impl Into<String>, path: impl Into<String>) -> Self {
        self.0.entry(category.into()).or_default().insert(path.into());
        self
    }

    /// Returns `true` if the endpoint path is selected in the category.
    #[must_use]
    pub fn contains(&self, category: &str, path: &str) -> bool {
        self.0.get(category).is_some_and(|paths| paths.contains(path))
    }

    /// Category names present in the selection.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of selected endpoint paths across categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a selection from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read selection file '{}': {e}",
                path.display()
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse selection file '{}': {e}",
                path.display()
            ))
        })
    }
}

/// Partition a catalog into chunks of at most `chunk_size` endpoints.
///
/// With `selection = None` every discovered endpoint is included. An empty
/// catalog or a selection matching nothing yields `Ok(vec![])`.
///
/// # Errors
///
/// Returns [`Error::Config`] if `chunk_size` is zero.
pub fn partition(
    catalog: &Catalog,
    selection: Option<&Selection>,
    chunk_size: usize,
) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(Error::Config("chunk_size must be at least 1".into()));
    }

    if let Some(selection) = selection {
        for name in selection.categories() {
            if catalog.category_index(name).is_none() {
                warn!(category = %name, "Selection names a category not present in the catalog");
            }
        }
    }

    let mut chunks = Vec::new();
    let mut buffer: Vec<ChunkEntry> = Vec::with_capacity(chunk_size);

    for (index, category) in catalog.categories.iter().enumerate() {
        for endpoint in &category.endpoints {
            if let Some(selection) = selection {
                if !selection.contains(&category.name, &endpoint.path) {
                    continue;
                }
            }

            buffer.push(ChunkEntry {
                category: category.name.clone(),
                category_index: index,
                category_description: category.description.clone(),
                endpoint: endpoint.clone(),
            });

            if buffer.len() == chunk_size {
                seal(&mut chunks, &mut buffer, chunk_size);
            }
        }
    }

    if !buffer.is_empty() {
        seal(&mut chunks, &mut buffer, chunk_size);
    }

    let total = chunks.len();
    for chunk in &mut chunks {
        chunk.total_chunks = total;
    }

    debug!(
        chunks = total,
        chunk_size,
        endpoints = chunks.iter().map(Chunk::len).sum::<usize>(),
        "Partitioned catalog"
    );

    Ok(chunks)
}

fn seal(chunks: &mut Vec<Chunk>, buffer: &mut Vec<ChunkEntry>, chunk_size: usize) {
    let entries = std::mem::replace(buffer, Vec::with_capacity(chunk_size));
    chunks.push(Chunk {
        chunk_id: chunks.len() + 1,
        entries,
        total_chunks: 0,
    });
}
