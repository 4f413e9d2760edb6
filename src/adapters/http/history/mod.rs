//! History HTTP adapter module.
//!
//! Read-only endpoint over the recent-message lists.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::ErrorResponse;
pub use handlers::{HistoryApiError, HistoryAppState};
pub use routes::history_routes;
