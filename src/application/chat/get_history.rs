//! GetHistory - Query handler for a user's recent messages.

use std::sync::Arc;

use crate::domain::chat::HistoryKey;
use crate::domain::foundation::UserId;
use crate::ports::{HistoryError, HistoryStore};

/// Query for the newest messages delivered to a user.
#[derive(Debug, Clone)]
pub struct GetHistoryQuery {
    pub user_id: UserId,
}

/// Handler for reading history. Never mutates the stored list.
pub struct GetHistoryHandler {
    store: Arc<dyn HistoryStore>,
    history_length: usize,
}

impl GetHistoryHandler {
    pub fn new(store: Arc<dyn HistoryStore>, history_length: usize) -> Self {
        Self {
            store,
            history_length,
        }
    }

    pub fn history_length(&self) -> usize {
        self.history_length
    }

    /// Up to `history_length` encoded messages, newest first.
    pub async fn handle(&self, query: GetHistoryQuery) -> Result<Vec<String>, HistoryError> {
        let key = HistoryKey::for_user(&query.user_id);
        self.store.recent(&key, self.history_length).await
    }
}
