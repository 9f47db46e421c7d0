//! Tavily Client
//!
//! Thin wrapper over the two Tavily endpoints the pipeline needs:
//!
//! 1. **Search** (`POST /search`): basic-depth web search, capped at
//!    `max_results` hits per query
//! 2. **Extract** (`POST /extract`): fetch one result page's raw content
//!    for cleaning and summarization

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const TAVILY_API_BASE: &str = "https://api.tavily.com";

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Tavily API key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Tavily API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No results found for query")]
    NoResults,
}

/// One web search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Title of the page
    pub title: String,
    /// URL of the page
    pub url: String,
    /// Content snippet returned alongside the hit
    #[serde(default)]
    pub content: String,
    /// Tavily's relevance score for the hit
    #[serde(default)]
    pub score: f32,
}

/// Tavily client for web search and page extraction
pub struct TavilyClient {
    client: Client,
    api_key: String,
    api_base: String,
    max_results: usize,
}

#[derive(Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct TavilyExtractRequest<'a> {
    api_key: &'a str,
    urls: Vec<&'a str>,
}

#[derive(Deserialize)]
struct TavilyExtractResponse {
    #[serde(default)]
    results: Vec<TavilyExtractResult>,
}

#[derive(Deserialize)]
struct TavilyExtractResult {
    #[serde(default)]
    raw_content: Option<String>,
}

impl TavilyClient {
    /// Create a new Tavily client
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_base: TAVILY_API_BASE.to_string(),
            max_results: 5,
        }
    }

    /// Configure client from config
    pub fn from_config(config: &crate::config::SearchConfig) -> Result<Self, SearchError> {
        if config.tavily_api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }

        Ok(Self::new(&config.tavily_api_key).with_max_results(config.max_results))
    }

    /// Point the client at a different endpoint. Used by tests to talk to a
    /// local mock server.
    pub fn with_api_base(api_key: &str, api_base: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            ..Self::new(api_key)
        }
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Search the web for pages matching `query`
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        info!(query = %query, "Searching the web via Tavily");

        let request = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: "basic",
            max_results: self.max_results,
            include_answer: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.api_base))
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TavilySearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        if parsed.results.is_empty() {
            return Err(SearchError::NoResults);
        }

        info!(count = parsed.results.len(), "Tavily search completed");
        Ok(parsed.results)
    }

    /// Fetch the raw content of one page
    pub async fn extract(&self, url: &str) -> Result<String, SearchError> {
        debug!(url = %url, "Extracting page content via Tavily");

        let request = TavilyExtractRequest {
            api_key: &self.api_key,
            urls: vec![url],
        };

        let response = self
            .client
            .post(format!("{}/extract", self.api_base))
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TavilyExtractResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ParseError(e.to_string()))?;

        let first = parsed.results.into_iter().next().ok_or(SearchError::NoResults)?;
        Ok(first.raw_content.unwrap_or_default())
    }
}
