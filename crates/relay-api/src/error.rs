//! API error types and JSON error response formatting.
//!
//! ApiError maps chat pipeline errors to HTTP status codes with a consistent
//! JSON body. Upstream failures are reported generically; their detail is
//! only logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_chat::ChatError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Message returned for any completion failure.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "chat completion failed";

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "upstream_error").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - the conversation is unusable.
    BadRequest(String),
    /// 502 Bad Gateway - the completion upstream failed.
    Upstream(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        if err.is_validation() {
            return ApiError::BadRequest(err.to_string());
        }
        error!(error = %err, "Chat completion failed");
        ApiError::Upstream(UPSTREAM_FAILURE_MESSAGE.to_string())
    }
}
