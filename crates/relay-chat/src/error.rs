//! Error types for the chat pipeline.

/// Errors from the chat pipeline.
///
/// Validation variants are the caller's fault and are detected before any
/// upstream call. Everything else is a provider-side failure.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("messages must not be empty")]
    EmptyConversation,
    #[error("at least one user message is required")]
    MissingUserMessage,
    #[error("completion transport error: {0}")]
    Transport(String),
    #[error("completion API returned HTTP {status}")]
    Upstream { status: u16 },
    #[error("completion response could not be decoded: {0}")]
    Decode(String),
    #[error("completion response contained no reply content")]
    EmptyReply,
    #[error("completion provider has been closed")]
    ProviderClosed,
}

impl ChatError {
    /// True for errors caused by a malformed request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyConversation | ChatError::MissingUserMessage
        )
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        // Strip the URL so upstream endpoints never reach the caller.
        ChatError::Transport(err.without_url().to_string())
    }
}
