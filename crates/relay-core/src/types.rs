use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Speaker of a conversational turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions or injected context for the model.
    System,
    /// The human asking questions.
    User,
    /// A previous model reply.
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of a conversation. Content may be empty but is always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// =============================================================================
// Chat request / response
// =============================================================================

/// Inbound body of `POST /chat`.
///
/// The caller supplies the whole conversation on every request; nothing is
/// remembered between requests.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Whether web search augmentation should be attempted.
    #[serde(default, rename = "useSearch", alias = "use_search")]
    pub use_search: bool,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>, use_search: bool) -> Self {
        Self {
            messages,
            use_search,
        }
    }
}

/// Outbound body of `POST /chat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Reply text with reasoning markup already removed.
    pub reply: String,
    #[serde(rename = "usedSearch", alias = "used_search")]
    pub used_search: bool,
    /// Model identifier of the active provider.
    pub model: String,
    /// Duration of the completion call only, in whole milliseconds.
    #[serde(rename = "latencyMs", alias = "latency_ms")]
    pub latency_ms: u64,
    #[serde(default)]
    pub citations: Vec<String>,
}

// =============================================================================
// Search
// =============================================================================

/// Result of one search augmentation attempt.
///
/// `used` is true iff at least one snippet was produced; an unused outcome
/// always has empty snippets and citations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Formatted snippets (title, content, source), in upstream rank order.
    pub snippets: Vec<String>,
    /// Non-empty source URLs of the snippets, in the same order.
    pub citations: Vec<String>,
    pub used: bool,
}

impl SearchOutcome {
    /// The neutral outcome: search was skipped or failed.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an outcome, deriving `used` from the snippets.
    pub fn from_parts(snippets: Vec<String>, citations: Vec<String>) -> Self {
        if snippets.is_empty() {
            return Self::empty();
        }
        Self {
            snippets,
            citations,
            used: true,
        }
    }
}
