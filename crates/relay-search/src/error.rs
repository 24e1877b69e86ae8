//! Error types for search calls.

/// Errors from a single search API call.
///
/// These never reach the chat caller: the augmenter logs them and falls
/// back to an empty outcome.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search API returned HTTP {status}")]
    Status { status: u16 },
    #[error("search response could not be decoded: {0}")]
    Decode(String),
}

impl SearchError {
    /// True if the call was cut off by the client timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Http(e) if e.is_timeout())
    }
}
