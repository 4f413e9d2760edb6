//! HTTP routes for history endpoints.

use axum::routing::get;
use axum::Router;

use super::handlers::{get_history, HistoryAppState};

/// Creates the history router.
pub fn history_routes(state: HistoryAppState) -> Router {
    Router::new()
        // GET /history/:user_id
        .route("/history/:user_id", get(get_history))
        .with_state(state)
}
