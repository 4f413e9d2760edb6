//! Integration tests for the HTTP surface.
//!
//! The full relay router is exercised with `tower::ServiceExt::oneshot`
//! against in-memory adapters; WebSocket upgrades are covered by the
//! session tests over loopback connections.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use chat_relay::adapters::http::{relay_router, HistoryAppState};
use chat_relay::adapters::websocket::WebSocketState;
use chat_relay::adapters::{InMemoryHistoryStore, InMemoryMessageBus};
use chat_relay::application::{ConnectionHandler, GetHistoryHandler, PresenceRegistry};
use chat_relay::domain::chat::HistoryKey;
use chat_relay::domain::foundation::UserId;
use chat_relay::ports::{HistoryStore, MessageBus};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app(history: Arc<InMemoryHistoryStore>, history_length: usize) -> Router {
    let connections = Arc::new(ConnectionHandler::new(
        Arc::new(InMemoryMessageBus::new()) as Arc<dyn MessageBus>,
        Arc::clone(&history) as Arc<dyn HistoryStore>,
        Arc::new(PresenceRegistry::new()),
    ));
    let get_history = Arc::new(GetHistoryHandler::new(
        history as Arc<dyn HistoryStore>,
        history_length,
    ));
    relay_router(
        WebSocketState::new(connections),
        HistoryAppState::new(get_history),
    )
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    // Extractor rejections answer with plain text.
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn seed(history: &InMemoryHistoryStore, id: &str, entries: &[&str]) {
    let key = HistoryKey::for_user(&UserId::new(id).unwrap());
    for entry in entries {
        history.push(&key, entry).await.unwrap();
    }
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn history_returns_newest_first() {
    let history = Arc::new(InMemoryHistoryStore::new());
    seed(&history, "bob", &["@alice first", "@carol second", "@alice third"]).await;

    let (status, body) = get(app(history, 50), "/history/bob").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!(["@alice third", "@carol second", "@alice first"])
    );
}

#[tokio::test]
async fn history_is_bounded_by_configured_length() {
    let history = Arc::new(InMemoryHistoryStore::new());
    seed(&history, "bob", &["@alice 1", "@alice 2", "@alice 3", "@alice 4"]).await;

    let (status, body) = get(app(Arc::clone(&history), 2), "/history/bob").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["@alice 4", "@alice 3"]));
    // Reading never trims the stored list.
    let key = HistoryKey::for_user(&UserId::new("bob").unwrap());
    assert_eq!(history.len(&key), 4);
}

#[tokio::test]
async fn history_for_unknown_user_is_empty() {
    let history = Arc::new(InMemoryHistoryStore::new());

    let (status, body) = get(app(history, 50), "/history/nobody").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn history_store_failure_returns_service_unavailable() {
    let history = Arc::new(InMemoryHistoryStore::new());
    history.set_unavailable(true);

    let (status, body) = get(app(history, 50), "/history/bob").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let history = Arc::new(InMemoryHistoryStore::new());

    let (status, _) = get(app(history, 50), "/messages/bob").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Health and WebSocket
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let history = Arc::new(InMemoryHistoryStore::new());

    let (status, body) = get(app(history, 50), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn websocket_route_requires_upgrade() {
    let history = Arc::new(InMemoryHistoryStore::new());

    let (status, _) = get(app(history, 50), "/ws/alice").await;

    assert!(status.is_client_error(), "unexpected status {}", status);
}
