use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RelayError, Result};

/// Top-level configuration for the relay backend.
///
/// Loaded from a TOML file, then overlaid with environment variables and
/// CLI flags. Built once at startup and handed to the components that need
/// it; nothing reads configuration lazily afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, or use defaults when the file
    /// does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error; an
    /// unknown provider tag must stop startup rather than fall back.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Overlay values from environment variables.
    ///
    /// `lookup` returns the value of a variable, or `None` when unset. Pass
    /// `|key| std::env::var(key).ok()` in production. Blank values are
    /// treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("APP_ENV") {
            self.general.app_env = parse_env("APP_ENV", &v)?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.general.log_level = v.trim().to_lowercase();
        }
        if let Some(v) = get("LOG_JSON") {
            self.general.log_json = parse_bool("LOG_JSON", &v)?;
        }

        if let Some(v) = get("BACKEND_HOST") {
            self.server.host = v.trim().to_string();
        }
        if let Some(v) = get("BACKEND_PORT") {
            self.server.port = parse_env("BACKEND_PORT", &v)?;
        }
        if let Some(v) = lookup("ALLOWED_ORIGINS") {
            self.server.allow_origins = parse_origins(&v);
        }

        if let Some(v) = get("LLM_PROVIDER") {
            self.llm.provider = parse_env("LLM_PROVIDER", &v)?;
        }
        if let Some(v) = get("LLM_TEMPERATURE") {
            self.llm.temperature = parse_env("LLM_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_env("LLM_MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.openai.api_key = Some(v.trim().to_string());
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.llm.openai.model = v.trim().to_string();
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.openai.base_url = v.trim().to_string();
        }
        if let Some(v) = get("PERPLEXITY_API_KEY") {
            self.llm.perplexity.api_key = Some(v.trim().to_string());
        }
        if let Some(v) = get("PERPLEXITY_MODEL") {
            self.llm.perplexity.model = v.trim().to_string();
        }
        if let Some(v) = get("PERPLEXITY_BASE_URL") {
            self.llm.perplexity.base_url = v.trim().to_string();
        }

        if let Some(v) = get("ENABLE_SEARCH") {
            self.search.enabled = parse_bool("ENABLE_SEARCH", &v)?;
        }
        if let Some(v) = get("TAVILY_API_KEY") {
            self.search.api_key = Some(v.trim().to_string());
        }

        Ok(())
    }

    /// Check values that would otherwise fail at request time.
    ///
    /// Provider credentials are checked when the provider is built, not here.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(RelayError::Config(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(RelayError::Config(
                "llm.max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.search.max_snippets == 0 {
            return Err(RelayError::Config(
                "search.max_snippets must be greater than zero".to_string(),
            ));
        }
        if self.search.timeout_ms == 0 {
            return Err(RelayError::Config(
                "search.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| RelayError::Config(format!("invalid value for {}: {}", key, e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RelayError::Config(format!(
            "invalid value for {}: expected a boolean, got '{}'",
            key, other
        ))),
    }
}

/// Split a comma-separated origin list. An all-blank list yields the default.
fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if origins.is_empty() {
        default_origins()
    } else {
        origins
    }
}

fn default_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

// =============================================================================
// Sections
// =============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[default]
    Development,
    Production,
    Test,
}

impl AppEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Production => "production",
            AppEnv::Test => "test",
        }
    }
}

impl std::fmt::Display for AppEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" => Ok(AppEnv::Development),
            "production" => Ok(AppEnv::Production),
            "test" => Ok(AppEnv::Test),
            other => Err(format!("unsupported app environment '{}'", other)),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub app_env: AppEnv,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_env: AppEnv::Development,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. `*` mirrors whatever origin the browser sends.
    pub allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allow_origins: default_origins(),
        }
    }
}

/// The closed set of completion provider variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions.
    #[default]
    OpenAi,
    /// Perplexity's OpenAI-compatible endpoint.
    Perplexity,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Perplexity => "perplexity",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "perplexity" => Ok(ProviderKind::Perplexity),
            other => Err(format!("unsupported LLM provider '{}'", other)),
        }
    }
}

/// Completion provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which provider variant is active for the lifetime of the process.
    pub provider: ProviderKind,
    /// Sampling temperature sent with every completion.
    pub temperature: f32,
    /// Generation cap (`max_tokens`) sent with every completion.
    pub max_tokens: u32,
    /// Whole-request timeout for completion calls.
    pub timeout_secs: u64,
    pub openai: ProviderEndpointConfig,
    pub perplexity: ProviderEndpointConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 120,
            openai: ProviderEndpointConfig {
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                base_url: "https://api.openai.com/v1".to_string(),
            },
            perplexity: ProviderEndpointConfig {
                api_key: None,
                model: "llama-3.1-sonar-large-128k-online".to_string(),
                base_url: "https://api.perplexity.ai".to_string(),
            },
        }
    }
}

impl LlmConfig {
    /// Endpoint settings of the active provider variant.
    pub fn active(&self) -> &ProviderEndpointConfig {
        match self.provider {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Perplexity => &self.perplexity,
        }
    }
}

/// Credentials and endpoint for one provider variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpointConfig {
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL of the OpenAI-compatible API, e.g. `https://api.perplexity.ai`.
    pub base_url: String,
}

/// Web search augmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Administrative switch; when false no search request is ever made.
    pub enabled: bool,
    /// Tavily API key. Search is skipped when absent.
    pub api_key: Option<String>,
    pub endpoint: String,
    /// Upper bound on a single search call.
    pub timeout_ms: u64,
    /// Number of results requested from the search API.
    pub max_results: u32,
    /// Number of top-ranked results turned into snippets.
    pub max_snippets: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            endpoint: "https://api.tavily.com/search".to_string(),
            timeout_ms: 10_000,
            max_results: 5,
            max_snippets: 3,
        }
    }
}
