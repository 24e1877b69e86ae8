//! Integration tests for the Relay API.
//!
//! Drive the router in-process with stub completion and search backends.
//! Each test builds its own state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use relay_api::error::UPSTREAM_FAILURE_MESSAGE;
use relay_api::handlers::HealthResponse;
use relay_api::{create_router, start_server, AppState};
use relay_chat::{ChatError, ChatOrchestrator, ChatProvider};
use relay_core::{Message, RelayConfig, Role, SearchOutcome};
use relay_search::SearchRunner;

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct StubProvider {
    fail: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<Message>>>,
}

#[async_trait]
impl ChatProvider for StubProvider {
    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(ChatError::Transport(
                "connection reset by https://secret.example with key sk-123".to_string(),
            ));
        }
        Ok("stub reply".to_string())
    }

    async fn close(&self) {}
}

struct StubSearch {
    outcome: SearchOutcome,
    calls: AtomicUsize,
}

impl StubSearch {
    fn new(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchRunner for StubSearch {
    async fn augment(&self, _query: &str) -> SearchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

struct Harness {
    app: axum::Router,
    provider: Arc<StubProvider>,
    search: Arc<StubSearch>,
}

fn harness_with(config: RelayConfig, provider: StubProvider, outcome: SearchOutcome) -> Harness {
    let provider = Arc::new(provider);
    let search = Arc::new(StubSearch::new(outcome));
    let orchestrator = ChatOrchestrator::new(
        Arc::clone(&provider) as Arc<dyn ChatProvider>,
        Arc::clone(&search) as Arc<dyn SearchRunner>,
    );
    let app = create_router(AppState::new(config, orchestrator));
    Harness {
        app,
        provider,
        search,
    }
}

fn harness() -> Harness {
    harness_with(
        RelayConfig::default(),
        StubProvider::default(),
        SearchOutcome::from_parts(
            vec!["S1".to_string(), "S2".to_string()],
            vec!["http://a".to_string()],
        ),
    )
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Read full response body as JSON.
async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_healthz() {
    let h = harness();
    let resp = h
        .app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json, json!({"status": "ok"}));
    let health: HealthResponse = serde_json::from_value(json).unwrap();
    assert_eq!(health.status, "ok");
}

// =============================================================================
// Chat
// =============================================================================

#[tokio::test]
async fn test_chat_without_search() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"user","content":"hi"}],"useSearch":false}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["reply"], "stub reply");
    assert_eq!(json["usedSearch"], false);
    assert_eq!(json["model"], "stub-model");
    assert!(json["latencyMs"].as_u64().is_some());
    assert_eq!(json["citations"], json!([]));

    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_chat_with_search() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"system","content":"be brief"},{"role":"user","content":"news?"}],"useSearch":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["usedSearch"], true);
    assert_eq!(json["citations"], json!(["http://a"]));

    let seen = h.provider.seen.lock().unwrap();
    assert_eq!(seen[0].len(), 3);
    assert_eq!(seen[0][2].role, Role::System);
    assert!(seen[0][2].content.contains("S1\n\nS2"));
}

#[tokio::test]
async fn test_chat_search_unused_when_no_results() {
    let h = harness_with(
        RelayConfig::default(),
        StubProvider::default(),
        SearchOutcome::empty(),
    );
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"user","content":"hi"}],"useSearch":true}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["usedSearch"], false);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.provider.seen.lock().unwrap()[0].len(), 1);
}

#[tokio::test]
async fn test_chat_use_search_defaults_to_false() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"user","content":"hi"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_empty_messages_returns_400() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json("/chat", r#"{"messages":[],"useSearch":true}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
    assert!(json["message"].as_str().unwrap().contains("messages"));
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_missing_messages_field_returns_400() {
    let h = harness();
    let resp = h.app.oneshot(post_json("/chat", r#"{}"#)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_no_user_message_returns_400() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"system","content":"x"},{"role":"assistant","content":"y"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["message"].as_str().unwrap().contains("user message"));
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_provider_failure_returns_502() {
    let provider = StubProvider {
        fail: true,
        ..StubProvider::default()
    };
    let h = harness_with(RelayConfig::default(), provider, SearchOutcome::empty());
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"user","content":"hi"}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "upstream_error");
    assert_eq!(json["message"], UPSTREAM_FAILURE_MESSAGE);
    let text = json.to_string();
    assert!(!text.contains("sk-123"));
    assert!(!text.contains("secret.example"));
}

#[tokio::test]
async fn test_chat_malformed_json_is_client_error() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json("/chat", r#"{"messages": [oops"#))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_unknown_role_is_client_error() {
    let h = harness();
    let resp = h
        .app
        .oneshot(post_json(
            "/chat",
            r#"{"messages":[{"role":"tool","content":"x"}]}"#,
        ))
        .await
        .unwrap();

    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn test_chat_oversized_body_rejected() {
    let h = harness();
    let content = "a".repeat(2 * 1024 * 1024);
    let body = json!({"messages": [{"role": "user", "content": content}]}).to_string();
    let resp = h.app.oneshot(post_json("/chat", &body)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_get_not_allowed() {
    let h = harness();
    let resp = h
        .app
        .oneshot(Request::get("/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// =============================================================================
// CORS
// =============================================================================

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/chat")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_allowed_origin() {
    let h = harness();
    let resp = h.app.oneshot(preflight("http://localhost:3000")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:3000"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
    assert_eq!(headers.get("access-control-allow-methods").unwrap(), "POST");
}

#[tokio::test]
async fn test_cors_unknown_origin_not_allowed() {
    let h = harness();
    let resp = h.app.oneshot(preflight("http://evil.example")).await.unwrap();
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_cors_wildcard_mirrors_origin() {
    let mut config = RelayConfig::default();
    config.server.allow_origins = vec!["*".to_string()];
    let h = harness_with(config, StubProvider::default(), SearchOutcome::empty());

    let resp = h.app.oneshot(preflight("http://anything.example")).await.unwrap();
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "http://anything.example"
    );
}

#[tokio::test]
async fn test_cors_invalid_origin_skipped() {
    let mut config = RelayConfig::default();
    config.server.allow_origins = vec![
        "bad\norigin".to_string(),
        "http://localhost:5173".to_string(),
    ];
    let h = harness_with(config, StubProvider::default(), SearchOutcome::empty());

    let resp = h.app.oneshot(preflight("http://localhost:5173")).await.unwrap();
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
}

// =============================================================================
// Server lifecycle
// =============================================================================

#[tokio::test]
async fn test_start_server_graceful_shutdown() {
    let mut config = RelayConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    let orchestrator = ChatOrchestrator::new(
        Arc::new(StubProvider::default()),
        Arc::new(StubSearch::new(SearchOutcome::empty())),
    );
    let state = AppState::new(config.clone(), orchestrator);

    let result = start_server(&config, state, std::future::ready(())).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_start_server_bind_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = RelayConfig::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    let orchestrator = ChatOrchestrator::new(
        Arc::new(StubProvider::default()),
        Arc::new(StubSearch::new(SearchOutcome::empty())),
    );
    let state = AppState::new(config.clone(), orchestrator);

    let err = start_server(&config, state, std::future::ready(()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to bind"));
    drop(listener);
}
