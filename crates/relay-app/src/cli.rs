//! CLI argument definitions for the Relay server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use relay_core::config::ProviderKind;
use relay_core::RelayConfig;
use std::path::PathBuf;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "relay.toml";

/// Chat completion backend with optional web search augmentation.
#[derive(Parser, Debug)]
#[command(name = "relay", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Completion provider (openai, perplexity).
    #[arg(long = "provider")]
    pub provider: Option<ProviderKind>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > RELAY_CONFIG env var > ./relay.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("RELAY_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Overlay flags that were given on the command line.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(provider) = self.provider {
            config.llm.provider = provider;
        }
    }
}
