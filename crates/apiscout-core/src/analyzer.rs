//! Content analyzer adapter: endpoint references in, enriched endpoints out.
//!
//! The dispatcher never shares an analyzer between chunks. It asks an
//! [`AnalyzerFactory`] for a fresh [`ContentAnalyzer`] per chunk task, so any
//! per-instance state stays local to one worker. Call pacing belongs to the
//! dispatcher's worker slots, not to analyzer instances.
//!
//! [`AnthropicAnalyzer`] backs the contract with a call to the Anthropic
//! Messages API. Any synchronous-in-effect implementation works: tests use
//! in-memory mocks.

use crate::config::AnalyzerConfig;
use crate::{ChunkEntry, ChunkExtraction, Error, ExtractedEndpoint, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Turns the endpoints of one chunk into structured extraction records.
#[async_trait]
pub trait ContentAnalyzer: Send {
    /// Analyze the given entries.
    ///
    /// Implementations should return one [`ExtractedEndpoint`] per entry they
    /// could describe. Any failure is contained by the dispatcher.
    async fn analyze(&mut self, entries: &[ChunkEntry]) -> Result<ChunkExtraction>;
}

/// Creates one analyzer per chunk task.
pub trait AnalyzerFactory: Send + Sync {
    /// Build a fresh analyzer instance.
    fn create(&self) -> Result<Box<dyn ContentAnalyzer>>;
}

impl<F> AnalyzerFactory for F
where
    F: Fn() -> Result<Box<dyn ContentAnalyzer>> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn ContentAnalyzer>> {
        self()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Analyzer backed by the Anthropic Messages API.
#[derive(Debug)]
pub struct AnthropicAnalyzer {
    client: Client,
    config: AnalyzerConfig,
    api_key: String,
}

impl AnthropicAnalyzer {
    /// Create an analyzer sharing an existing HTTP client.
    #[must_use]
    pub fn new(client: Client, config: AnalyzerConfig, api_key: String) -> Self {
        Self {
            client,
            config,
            api_key,
        }
    }

    async fn call_messages_api(&self, prompt: String) -> Result<String> {
        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Analyzer(format!(
                "Messages API returned {status}: {body}"
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .into_iter()
            .find(|block| block.content_type == "text")
            .map(|block| block.text)
            .ok_or_else(|| Error::Analyzer("No text content in analyzer response".into()))
    }
}

#[async_trait]
impl ContentAnalyzer for AnthropicAnalyzer {
    async fn analyze(&mut self, entries: &[ChunkEntry]) -> Result<ChunkExtraction> {
        if entries.is_empty() {
            return Ok(ChunkExtraction::default());
        }

        let prompt = build_prompt(entries)?;
        debug!(endpoints = entries.len(), model = %self.config.model, "Calling analyzer");
        let text = self.call_messages_api(prompt).await?;
        parse_extraction(&text, entries)
    }
}

/// Factory producing [`AnthropicAnalyzer`] instances.
///
/// The HTTP client is cloned into each analyzer.
#[derive(Debug, Clone)]
pub struct AnthropicAnalyzerFactory {
    client: Client,
    config: AnalyzerConfig,
    api_key: String,
}

impl AnthropicAnalyzerFactory {
    /// Build a factory, reading the API key from the configured env var.
    pub fn from_config(config: AnalyzerConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Build a factory with an explicit API key.
    pub fn with_api_key(config: AnalyzerConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("apiscout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Network)?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }
}

impl AnalyzerFactory for AnthropicAnalyzerFactory {
    fn create(&self) -> Result<Box<dyn ContentAnalyzer>> {
        Ok(Box::new(AnthropicAnalyzer::new(
            self.client.clone(),
            self.config.clone(),
            self.api_key.clone(),
        )))
    }
}

#[derive(Serialize)]
struct PromptEntry<'a> {
    category: &'a str,
    title: &'a str,
    method: &'a str,
    path: &'a str,
    url: &'a str,
}

fn build_prompt(entries: &[ChunkEntry]) -> Result<String> {
    let listing: Vec<PromptEntry<'_>> = entries
        .iter()
        .map(|e| PromptEntry {
            category: &e.category,
            title: &e.endpoint.title,
            method: &e.endpoint.method,
            path: &e.endpoint.path,
            url: &e.endpoint.url,
        })
        .collect();
    let listing = serde_json::to_string_pretty(&listing)?;

    Ok(format!(
        r#"Describe each of the following documented API endpoints.

Endpoints:
```json
{listing}
```

Reply with a single JSON object of this shape:
```json
{{
  "endpoints": [
    {{
      "category": "category name from the input",
      "categoryDescription": "one sentence about the category",
      "method": "GET",
      "path": "/path/from/input",
      "title": "short title",
      "url": "documentation url from the input",
      "description": "what the endpoint does",
      "auth": "authentication requirement, if any",
      "parameters": [
        {{"name": "id", "in": "path", "type": "string", "required": true, "description": ""}}
      ],
      "requestBody": null,
      "response": null,
      "examples": ["curl ..."]
    }}
  ]
}}
```
Return one entry per input endpoint and keep the input path unchanged."#
    ))
}

#[derive(Debug, Deserialize)]
struct AnalysisDocument {
    endpoints: Vec<ExtractedEndpoint>,
}

/// Parse an analyzer's text reply into a validated [`ChunkExtraction`].
///
/// Accepts a fenced ```` ```json ```` block or the outermost `{...}` span.
/// Each returned endpoint must carry a non-empty path. Missing category,
/// title and URL fields are filled from the input entry with the same path.
pub fn parse_extraction(text: &str, entries: &[ChunkEntry]) -> Result<ChunkExtraction> {
    let json = extract_json_block(text);
    let document: AnalysisDocument = serde_json::from_str(json)
        .map_err(|e| Error::Analyzer(format!("Failed to parse analyzer response: {e}")))?;

    let mut endpoints = Vec::with_capacity(document.endpoints.len());
    for (position, mut endpoint) in document.endpoints.into_iter().enumerate() {
        endpoint.path = endpoint.path.trim().to_string();
        if endpoint.path.is_empty() {
            return Err(Error::Analyzer(format!(
                "Analyzer returned endpoint #{} without a path",
                position + 1
            )));
        }
        endpoint.method = endpoint.method.trim().to_ascii_uppercase();

        let source = entries
            .iter()
            .find(|e| e.endpoint.path == endpoint.path && e.endpoint.method == endpoint.method)
            .or_else(|| entries.iter().find(|e| e.endpoint.path == endpoint.path))
            .or_else(|| entries.get(position));

        if let Some(source) = source {
            if endpoint.category.trim().is_empty() {
                endpoint.category.clone_from(&source.category);
            }
            if endpoint.title.is_empty() {
                endpoint.title.clone_from(&source.endpoint.title);
            }
            if endpoint.url.is_empty() {
                endpoint.url.clone_from(&source.endpoint.url);
            }
        } else if endpoint.category.trim().is_empty() {
            return Err(Error::Analyzer(format!(
                "Cannot attribute endpoint '{}' to a category",
                endpoint.path
            )));
        }

        endpoints.push(endpoint);
    }

    Ok(ChunkExtraction { endpoints })
}

fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let body = &text[start + 7..];
        return body.find("```").map_or(body, |end| &body[..end]).trim();
    }
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text.trim(),
    }
}
