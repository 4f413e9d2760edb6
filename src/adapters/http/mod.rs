//! HTTP adapters - REST endpoints and the assembled application router.

pub mod health;
pub mod history;

pub use health::health_routes;
pub use history::{history_routes, HistoryAppState};

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};

/// Full relay router: WebSocket endpoint, history reads and health.
pub fn relay_router(ws_state: WebSocketState, history_state: HistoryAppState) -> Router {
    Router::new()
        .merge(websocket_router(ws_state))
        .merge(history_routes(history_state))
        .merge(health_routes())
        .layer(TraceLayer::new_for_http())
}
