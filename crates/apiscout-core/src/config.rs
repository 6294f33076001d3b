//! Configuration management for apiscout.
//!
//! Configuration is stored as TOML and split into three sections matching
//! the pipeline stages. Every field has a default, so a missing file or a
//! partial file is valid.
//!
//! ## File Location
//!
//! 1. `APISCOUT_CONFIG` environment variable, when set
//! 2. Platform config directory: `<config_dir>/apiscout/config.toml`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [discovery]
//! max_depth = 1
//! max_pages = 50
//!
//! [extraction]
//! chunk_size = 5
//! max_workers = 5
//! chunk_timeout_secs = 120
//! retry_failed = false
//!
//! [analyzer]
//! model = "claude-sonnet-4-20250514"
//! api_key_env = "ANTHROPIC_API_KEY"
//! min_call_interval_ms = 500
//! ```
//!
//! ```rust
//! use apiscout_core::Config;
//!
//! let config: Config = toml::from_str("[extraction]\nchunk_size = 8\n")?;
//! assert_eq!(config.extraction.chunk_size, 8);
//! assert_eq!(config.extraction.max_workers, 5);
//! # Ok::<(), toml::de::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "APISCOUT_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Documentation crawling settings.
    pub discovery: DiscoveryConfig,
    /// Chunking and worker pool settings.
    pub extraction: ExtractionConfig,
    /// Content analyzer (language model) settings.
    pub analyzer: AnalyzerConfig,
}

/// Settings for the discovery crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// How many navigation hops to follow from the root page.
    pub max_depth: usize,
    /// Upper bound on pages fetched in one discovery run.
    pub max_pages: usize,
    /// Per-request timeout for documentation pages, in seconds.
    pub request_timeout_secs: u64,
    /// User agent sent with documentation requests.
    pub user_agent: String,
    /// Optional filter: keep only endpoints whose title or path contains it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_pages: 50,
            request_timeout_secs: 30,
            user_agent: concat!("apiscout/", env!("CARGO_PKG_VERSION")).to_string(),
            query: None,
        }
    }
}

impl DiscoveryConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Settings for partitioning and parallel dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Endpoints per chunk.
    pub chunk_size: usize,
    /// Upper bound on concurrently running chunk workers.
    pub max_workers: usize,
    /// Per-chunk time budget in seconds; `0` disables the timeout.
    pub chunk_timeout_secs: u64,
    /// Re-run each failed chunk once with a fresh analyzer.
    pub retry_failed: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::partition::DEFAULT_CHUNK_SIZE,
            max_workers: crate::dispatch::DEFAULT_MAX_WORKERS,
            chunk_timeout_secs: 120,
            retry_failed: false,
        }
    }
}

impl ExtractionConfig {
    /// Per-chunk timeout, or `None` when disabled.
    #[must_use]
    pub const fn chunk_timeout(&self) -> Option<Duration> {
        if self.chunk_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.chunk_timeout_secs))
        }
    }
}

/// Settings for the language-model content analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Model identifier sent to the Messages API.
    pub model: String,
    /// API base URL (overridable for proxies and tests).
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Maximum tokens requested per analyzer call.
    pub max_tokens: u32,
    /// Minimum delay between two analyzer calls on the same worker slot.
    pub min_call_interval_ms: u64,
    /// HTTP timeout for one analyzer call, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 4096,
            min_call_interval_ms: 500,
            request_timeout_secs: 90,
        }
    }
}

impl AnalyzerConfig {
    /// Minimum interval between calls as a [`Duration`].
    #[must_use]
    pub const fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }

    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "Analyzer API key not set; export {}",
                self.api_key_env
            ))),
        }
    }
}

impl Config {
    /// Load configuration from `APISCOUT_CONFIG` or the platform location.
    ///
    /// A missing file yields defaults; a malformed file is an error.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {e}")))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;
        Ok(())
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.extraction.chunk_size == 0 {
            return Err(Error::Config("extraction.chunk_size must be at least 1".into()));
        }
        if self.extraction.max_workers == 0 {
            return Err(Error::Config("extraction.max_workers must be at least 1".into()));
        }
        if self.discovery.max_pages == 0 {
            return Err(Error::Config("discovery.max_pages must be at least 1".into()));
        }
        Ok(())
    }

    /// Path of the configuration file that [`Config::load`] reads.
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }
        let dirs = directories::ProjectDirs::from("dev", "apiscout", "apiscout")
            .ok_or_else(|| Error::Config("Failed to determine project directories".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}
