//! Application state shared across all route handlers.

use std::sync::Arc;

use relay_chat::ChatOrchestrator;
use relay_core::RelayConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks. Nothing here
/// is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// The single orchestrator serving every chat request.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Configuration as resolved at startup.
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: RelayConfig, orchestrator: ChatOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            config: Arc::new(config),
        }
    }
}
