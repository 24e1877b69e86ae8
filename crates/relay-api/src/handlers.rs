//! Route handler functions.

use axum::extract::State;
use axum::Json;
use relay_core::{ChatRequest, ChatResponse};
use serde::{Deserialize, Serialize};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /healthz - liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /chat - run one conversation turn through the orchestrator.
///
/// Validation failures return 400; any completion failure returns 502 with a
/// generic message.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, use_search = body.use_search);

    async move {
        let response = state.orchestrator.handle(&body).await?;
        Ok(Json(response))
    }
    .instrument(span)
    .await
}
