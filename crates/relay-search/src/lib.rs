//! Web search augmentation for chat requests.
//!
//! Queries the Tavily search API and turns the top results into
//! citation-bearing snippets. A failed or skipped search degrades to an
//! empty [`SearchOutcome`](relay_core::SearchOutcome); it never fails the
//! chat request.

pub mod augmenter;
pub mod error;
pub mod tavily;

pub use augmenter::{format_snippet, SearchRunner, TavilyAugmenter, DEFAULT_TITLE};
pub use error::SearchError;
pub use tavily::{TavilyClient, TavilyResult};
