//! Router setup with all API routes and middleware.

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use relay_core::{RelayConfig, RelayError};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::state::AppState;

/// Maximum accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Build the CORS layer from the configured origin list.
///
/// Credentials are allowed, so methods and headers mirror the request rather
/// than using a wildcard. A `*` entry mirrors any request origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Skipping invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allow_origins);

    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `host:port` from config and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &RelayConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), RelayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Starting API server on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RelayError::Api(format!("Server error: {}", e)))?;

    info!("API server stopped");
    Ok(())
}
