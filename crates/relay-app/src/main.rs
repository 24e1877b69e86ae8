//! Relay server entry point.
//!
//! Resolves configuration, builds the completion provider and search
//! augmenter, and serves the HTTP API until Ctrl-C or SIGTERM.

mod cli;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use relay_api::{start_server, AppState};
use relay_chat::{build_provider, ChatOrchestrator};
use relay_core::config::GeneralConfig;
use relay_core::RelayConfig;
use relay_search::TavilyAugmenter;

use crate::cli::CliArgs;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(general: &GeneralConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&general.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if general.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve configuration: file (or defaults when absent), then environment,
/// then command-line flags.
fn resolve_config(args: &CliArgs) -> Result<RelayConfig, Box<dyn std::error::Error>> {
    let config_file = args.resolve_config_path();
    let mut config = RelayConfig::load_or_default(&config_file)?;

    config.apply_env(|key| std::env::var(key).ok())?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received terminate signal, starting graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let config = resolve_config(&args)?;

    init_tracing(&config.general);
    info!(
        app_env = %config.general.app_env,
        "Starting Relay v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Missing credentials stop the process here, before anything is bound.
    let provider = match build_provider(&config.llm) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to initialise completion provider");
            return Err(e.into());
        }
    };

    let search = Arc::new(TavilyAugmenter::new(config.search.clone()));
    info!(
        enabled = config.search.enabled,
        "Search augmentation configured"
    );

    let orchestrator = ChatOrchestrator::new(Arc::clone(&provider), search);
    info!(model = %orchestrator.model(), "Chat orchestrator ready");
    let state = AppState::new(config.clone(), orchestrator);

    let served = start_server(&config, state, shutdown_signal()).await;

    provider.close().await;

    if let Err(ref e) = served {
        error!(error = %e, "API server failed");
    }
    served?;

    info!("Relay stopped");
    Ok(())
}
