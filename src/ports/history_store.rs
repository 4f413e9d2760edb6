//! HistoryStore port - Interface for per-user recent-message lists.

use async_trait::async_trait;

use crate::domain::chat::HistoryKey;

/// Errors that can occur in history store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    /// Store unreachable or the command failed.
    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

/// Port for the newest-first message history of each user.
///
/// Implementations never trim on write; the list grows until something
/// outside the relay trims it.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Prepend an entry, making it the newest.
    async fn push(&self, key: &HistoryKey, entry: &str) -> Result<(), HistoryError>;

    /// Read up to `limit` entries, newest first, without modifying the list.
    ///
    /// A key that was never written yields an empty vec.
    async fn recent(&self, key: &HistoryKey, limit: usize) -> Result<Vec<String>, HistoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn HistoryStore) {}

    #[test]
    fn history_error_displays_reason() {
        let err = HistoryError::Unavailable("timeout".to_string());
        assert_eq!(err.to_string(), "History store unavailable: timeout");
    }
}
