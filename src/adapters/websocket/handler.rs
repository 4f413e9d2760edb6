//! WebSocket upgrade handler for chat connections.
//!
//! Handles the HTTP → WebSocket upgrade and hands the connection to the
//! application layer:
//! 1. Validate the user id from the path
//! 2. Upgrade to WebSocket (the transport handshake)
//! 3. Split the socket into sending and receiving halves
//! 4. Run the connection through `ConnectionHandler::on_connect` until it closes

use std::sync::Arc;

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::StreamExt;

use crate::application::chat::ConnectionHandler;
use crate::domain::foundation::UserId;

use super::connection::{WsFrameReceiver, WsFrameSender};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Admission and session runner shared by all connections.
    pub connections: Arc<ConnectionHandler>,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(connections: Arc<ConnectionHandler>) -> Self {
        Self { connections }
    }
}

/// Handle WebSocket upgrade requests for a user.
///
/// Route: `GET /ws/:user_id`
///
/// The id in the path is trusted as-is; there is no authentication.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<WebSocketState>,
) -> Response {
    let user_id = match UserId::new(user_id) {
        Ok(id) => id,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

/// Run an established WebSocket connection until its session ends.
async fn handle_socket(socket: WebSocket, user_id: UserId, state: WebSocketState) {
    let (sink, stream) = socket.split();

    let outcome = state
        .connections
        .on_connect(WsFrameSender::new(sink), WsFrameReceiver::new(stream), user_id.clone())
        .await;

    tracing::debug!(user_id = %user_id, outcome = %outcome, "WebSocket connection finished");
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router(state: WebSocketState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/ws/:user_id", get(ws_handler))
        .with_state(state)
}
