//! Search augmenter: decides whether to search and shapes results into
//! snippets and citations.

use std::time::Duration;

use async_trait::async_trait;
use relay_core::config::SearchConfig;
use relay_core::SearchOutcome;
use tracing::{debug, warn};

use crate::tavily::{TavilyClient, TavilyResult};

/// Title used when a result carries none ("no title").
pub const DEFAULT_TITLE: &str = "제목 없음";

/// Anything that can turn a user query into a [`SearchOutcome`].
///
/// Implementations must not fail: every problem degrades to
/// [`SearchOutcome::empty`].
#[async_trait]
pub trait SearchRunner: Send + Sync {
    async fn augment(&self, query: &str) -> SearchOutcome;
}

/// Format one result as a human-readable snippet.
pub fn format_snippet(result: &TavilyResult) -> String {
    let title = result.title.as_deref().unwrap_or(DEFAULT_TITLE);
    let content = result.content.as_deref().unwrap_or("");
    let url = result.url.as_deref().unwrap_or("");
    format!("제목: {}\n내용: {}\n출처: {}", title, content, url)
}

/// Build an outcome from ranked results, keeping the first `max_snippets`.
fn outcome_from_results(results: &[TavilyResult], max_snippets: usize) -> SearchOutcome {
    let top = &results[..results.len().min(max_snippets)];

    let snippets: Vec<String> = top.iter().map(format_snippet).collect();
    let citations: Vec<String> = top
        .iter()
        .filter_map(|r| r.url.as_deref())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    SearchOutcome::from_parts(snippets, citations)
}

/// [`SearchRunner`] backed by the Tavily API.
#[derive(Debug, Clone)]
pub struct TavilyAugmenter {
    config: SearchConfig,
}

impl TavilyAugmenter {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[async_trait]
impl SearchRunner for TavilyAugmenter {
    async fn augment(&self, query: &str) -> SearchOutcome {
        if !self.config.enabled {
            return SearchOutcome::empty();
        }

        let Some(api_key) = self.api_key() else {
            debug!("Search requested but Tavily API key missing");
            return SearchOutcome::empty();
        };

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let client = match TavilyClient::new(api_key, self.config.endpoint.as_str(), timeout) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to build search client");
                return SearchOutcome::empty();
            }
        };

        let result = client.search(query, self.config.max_results).await;
        client.close();

        let results = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, timeout = e.is_timeout(), "Tavily search failed");
                return SearchOutcome::empty();
            }
        };

        let outcome = outcome_from_results(&results, self.config.max_snippets);
        debug!(
            results = results.len(),
            snippets = outcome.snippets.len(),
            citations = outcome.citations.len(),
            "Search completed"
        );
        outcome
    }
}
