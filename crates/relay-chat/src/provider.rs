//! Completion provider trait and the OpenAI-compatible implementation.
//!
//! Exactly one provider is built per process, from [`LlmConfig`], and shared
//! by every request. Both supported variants speak the OpenAI chat
//! completions wire format; they differ only in credentials, model, and
//! base URL.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use relay_core::config::{LlmConfig, ProviderEndpointConfig, ProviderKind};
use relay_core::{Message, RelayError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ChatError;
use crate::reasoning::strip_reasoning;

/// Upstream chat-completion API as seen by the orchestrator.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Model identifier of the active provider.
    fn model(&self) -> &str;

    /// Send the conversation upstream and return the cleaned reply text.
    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError>;

    /// Release the transport. Called once during shutdown.
    async fn close(&self);
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

// =============================================================================
// OpenAiCompatibleProvider
// =============================================================================

/// Provider for any OpenAI-compatible `chat/completions` endpoint.
///
/// The HTTP client pools connections internally and is cloned (cheaply) per
/// request, so concurrent completions never contend on a lock for the
/// duration of the call.
pub struct OpenAiCompatibleProvider {
    kind: ProviderKind,
    model: String,
    endpoint: String,
    api_key: String,
    temperature: f32,
    max_tokens: u32,
    client: RwLock<Option<Client>>,
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    /// Build a provider for `kind` using its endpoint settings.
    ///
    /// `base_url` must already be normalized with a trailing `/`.
    pub fn new(
        kind: ProviderKind,
        api_key: String,
        model: String,
        base_url: &str,
        llm: &LlmConfig,
    ) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(llm.timeout_secs))
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            kind,
            model,
            endpoint: format!("{}chat/completions", base_url),
            api_key,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            client: RwLock::new(Some(client)),
        })
    }

    /// Which provider variant this is.
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn client(&self) -> Result<Client, ChatError> {
        let guard = self.client.read().unwrap_or_else(|e| e.into_inner());
        guard.clone().ok_or(ChatError::ProviderClosed)
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError> {
        let client = self.client()?;

        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(500).collect();
            warn!(
                provider = %self.kind,
                status = status.as_u16(),
                body = %preview,
                "Completion API returned an error"
            );
            return Err(ChatError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: CompletionResponse =
            serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ChatError::EmptyReply)?;

        Ok(strip_reasoning(&content))
    }

    async fn close(&self) {
        let mut guard = self.client.write().unwrap_or_else(|e| e.into_inner());
        if guard.take().is_some() {
            info!(provider = %self.kind, "Chat completion provider closed");
        }
    }
}

// =============================================================================
// Variant selection
// =============================================================================

/// Ensure a base URL ends with exactly one trailing `/`.
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}

fn require_api_key(endpoint: &ProviderEndpointConfig, env_name: &str) -> Result<String, RelayError> {
    endpoint
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RelayError::Config(format!("{} is not set", env_name)))
}

/// Build the single process-wide provider from configuration.
///
/// Missing credentials are a fatal configuration error, reported here at
/// startup rather than on the first request.
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn ChatProvider>, RelayError> {
    let endpoint = config.active();
    let key_var = match config.provider {
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Perplexity => "PERPLEXITY_API_KEY",
    };
    let api_key = require_api_key(endpoint, key_var)?;

    let base_url = if !endpoint.base_url.trim().is_empty() {
        normalize_base_url(&endpoint.base_url)
    } else {
        match config.provider {
            ProviderKind::OpenAi => normalize_base_url(&LlmConfig::default().openai.base_url),
            ProviderKind::Perplexity => {
                return Err(RelayError::Config(
                    "PERPLEXITY_BASE_URL is not set".to_string(),
                ));
            }
        }
    };

    let provider = OpenAiCompatibleProvider::new(
        config.provider,
        api_key,
        endpoint.model.clone(),
        &base_url,
        config,
    )?;

    info!(
        provider = %provider.kind(),
        model = %provider.model,
        "Chat completion provider initialised"
    );

    Ok(Arc::new(provider))
}
