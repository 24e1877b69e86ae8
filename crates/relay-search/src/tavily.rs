//! Thin client for the Tavily search API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Request body for `POST /search`.
#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    include_answer: bool,
    include_images: bool,
    include_raw_content: bool,
    max_results: u32,
    include_domains: Vec<String>,
    exclude_domains: Vec<String>,
}

/// Response body of `POST /search`.
#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

/// One ranked search hit. Every field may be missing or null upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TavilyResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Tavily client owning its own connection pool.
///
/// Created for a single augmentation call and dropped afterwards; the
/// connection is not shared between requests.
pub struct TavilyClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl TavilyClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Run a basic-depth search and return the ranked results.
    pub async fn search(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<TavilyResult>, SearchError> {
        let request = TavilySearchRequest {
            api_key: &self.api_key,
            query,
            search_depth: "basic",
            include_answer: false,
            include_images: false,
            include_raw_content: false,
            max_results,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(SearchError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: TavilySearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(parsed.results)
    }

    /// Release the connection pool.
    pub fn close(self) {
        drop(self.client);
    }
}
