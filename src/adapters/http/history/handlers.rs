//! HTTP handlers for history endpoints.
//!
//! These handlers connect Axum routes to the history query handler.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::chat::{GetHistoryHandler, GetHistoryQuery};
use crate::domain::foundation::UserId;
use crate::ports::HistoryError;

use super::dto::ErrorResponse;

// ════════════════════════════════════════════════════════════════════════════════
// Error Type
// ════════════════════════════════════════════════════════════════════════════════

/// History API error that implements IntoResponse.
#[derive(Debug)]
pub enum HistoryApiError {
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for HistoryApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            HistoryApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            HistoryApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorResponse::unavailable(msg))
            }
        };
        (status, Json(error)).into_response()
    }
}

impl From<HistoryError> for HistoryApiError {
    fn from(error: HistoryError) -> Self {
        match error {
            HistoryError::Unavailable(msg) => HistoryApiError::Unavailable(msg),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for history endpoints.
#[derive(Clone)]
pub struct HistoryAppState {
    pub get_history: Arc<GetHistoryHandler>,
}

impl HistoryAppState {
    pub fn new(get_history: Arc<GetHistoryHandler>) -> Self {
        Self { get_history }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /history/:user_id
///
/// Newest-first list of encoded messages delivered to the user.
pub async fn get_history(
    State(state): State<HistoryAppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<String>>, HistoryApiError> {
    let user_id = UserId::new(user_id).map_err(|e| HistoryApiError::BadRequest(e.to_string()))?;

    let history = state
        .get_history
        .handle(GetHistoryQuery { user_id })
        .await
        .map_err(|e| {
            tracing::warn!("History read failed: {}", e);
            HistoryApiError::from(e)
        })?;

    Ok(Json(history))
}
