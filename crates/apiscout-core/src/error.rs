//! Error types and handling for apiscout-core operations.
//!
//! Errors fall into two groups that the pipeline treats very differently:
//!
//! - **Hard failures** (discovery, configuration, invalid input) are returned
//!   as `Err` and abort the run before any extraction work is scheduled.
//! - **Soft failures** (a single chunk's analyzer call failing or timing out)
//!   never escape the dispatcher. They are recorded inline in
//!   [`ChunkResult::error`](crate::ChunkResult) so callers can decide whether
//!   partial results are acceptable.
//!
//! ## Error Categories
//!
//! - **I/O Errors**: file system operations (config files, selection files)
//! - **Network Errors**: HTTP requests issued by the fetcher or analyzer
//! - **Parse Errors**: HTML and endpoint-signature parsing
//! - **Discovery Errors**: the root documentation page could not be used
//! - **Analyzer Errors**: the content analyzer returned nothing usable
//! - **Configuration Errors**: invalid settings or config files
//!
//! ```rust
//! use apiscout_core::Error;
//!
//! let err = Error::Timeout("chunk 3 exceeded 120s".to_string());
//! assert!(err.is_recoverable());
//! assert_eq!(err.category(), "timeout");
//! ```

use thiserror::Error;

/// The main error type for apiscout-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Connection and timeout errors are recoverable, while malformed URLs
    /// and TLS failures are not.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Content could not be parsed into the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found (HTTP 404, missing file).
    #[error("Not found: {0}")]
    NotFound(String),

    /// URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Operation exceeded its configured time budget.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Discovery could not produce a catalog.
    ///
    /// Raised when the root documentation page is unreachable or
    /// unparseable. The pipeline never proceeds to partitioning after this.
    #[error("Discovery failed for '{url}': {reason}")]
    Discovery {
        /// Root URL that discovery started from.
        url: String,
        /// Underlying reason.
        reason: String,
    },

    /// The content analyzer call failed or returned malformed output.
    #[error("Analyzer error: {0}")]
    Analyzer(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// ```rust
    /// use apiscout_core::Error;
    ///
    /// assert!(Error::Timeout("slow".into()).is_recoverable());
    /// assert!(!Error::Config("chunk_size must be >= 1".into()).is_recoverable());
    /// ```
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout(_) | Self::Analyzer(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::InvalidUrl(_) => "invalid_url",
            Self::Timeout(_) => "timeout",
            Self::Serialization(_) => "serialization",
            Self::Discovery { .. } => "discovery",
            Self::Analyzer(_) => "analyzer",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
