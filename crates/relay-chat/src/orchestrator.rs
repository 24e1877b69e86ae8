//! Chat orchestrator: validate, optionally augment with search, complete,
//! and assemble the response.
//!
//! Holds no per-conversation state. Each call to [`ChatOrchestrator::handle`]
//! is an independent, strictly sequential pipeline; many calls may run
//! concurrently against the same orchestrator.

use std::sync::Arc;
use std::time::Instant;

use relay_core::{ChatRequest, ChatResponse, Message, Role};
use relay_search::SearchRunner;
use tracing::{debug, info};

use crate::error::ChatError;
use crate::provider::ChatProvider;

/// Instruction placed before injected search results. Tells the model to
/// prefer the results and not to invent unsourced claims.
pub const SEARCH_PREAMBLE: &str = "다음은 최신 검색 결과입니다.\n\
질문에 답변할 때 아래 정보를 우선적으로 참고하고,\n\
출처가 명확하지 않은 내용은 만들지 마세요.\n\n";

/// Build the synthetic system message carrying search snippets.
pub fn build_search_message(snippets: &[String]) -> Message {
    Message::system(format!("{}{}", SEARCH_PREAMBLE, snippets.join("\n\n")))
}

/// Content of the most recent user message.
fn latest_user_query(messages: &[Message]) -> Result<&str, ChatError> {
    if messages.is_empty() {
        return Err(ChatError::EmptyConversation);
    }
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .ok_or(ChatError::MissingUserMessage)
}

/// Coordinates the search augmenter and the completion provider.
pub struct ChatOrchestrator {
    provider: Arc<dyn ChatProvider>,
    search: Arc<dyn SearchRunner>,
}

impl ChatOrchestrator {
    pub fn new(provider: Arc<dyn ChatProvider>, search: Arc<dyn SearchRunner>) -> Self {
        Self { provider, search }
    }

    /// Model identifier of the shared provider.
    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Answer one chat request.
    ///
    /// Validation errors are returned before any upstream call. Search
    /// failures never surface here; completion failures do.
    pub async fn handle(&self, request: &ChatRequest) -> Result<ChatResponse, ChatError> {
        let query = latest_user_query(&request.messages)?;

        let mut conversation = request.messages.clone();
        let mut citations = Vec::new();
        let mut used_search = false;

        if request.use_search {
            let outcome = self.search.augment(query).await;
            if outcome.used {
                conversation.push(build_search_message(&outcome.snippets));
                citations = outcome.citations;
                used_search = true;
            }
            debug!(used = used_search, citations = citations.len(), "Search augmentation finished");
        }

        let start = Instant::now();
        let reply = self.provider.complete(&conversation).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        info!(
            model = %self.provider.model(),
            latency_ms,
            used_search,
            citations = citations.len(),
            "Chat completion served"
        );

        Ok(ChatResponse {
            reply,
            used_search,
            model: self.provider.model().to_string(),
            latency_ms,
            citations,
        })
    }
}
