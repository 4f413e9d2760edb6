//! In-Memory History Store Adapter
//!
//! Keeps each user's history as a `VecDeque`, newest at the front.
//! Useful for testing and development.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::domain::chat::HistoryKey;
use crate::ports::{HistoryError, HistoryStore};

/// In-memory history lists keyed by [`HistoryKey`].
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    lists: RwLock<HashMap<HistoryKey, VecDeque<String>>>,
    unavailable: AtomicBool,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Make every subsequent operation fail with `HistoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Full list for `key`, newest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn entries(&self, key: &HistoryKey) -> Vec<String> {
        self.lists
            .read()
            .expect("InMemoryHistoryStore: lists lock poisoned")
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Length of the list for `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn len(&self, key: &HistoryKey) -> usize {
        self.lists
            .read()
            .expect("InMemoryHistoryStore: lists lock poisoned")
            .get(key)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), HistoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HistoryError::Unavailable("store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn push(&self, key: &HistoryKey, entry: &str) -> Result<(), HistoryError> {
        self.check_available()?;
        self.lists
            .write()
            .expect("InMemoryHistoryStore: lists write lock poisoned")
            .entry(key.clone())
            .or_default()
            .push_front(entry.to_string());
        Ok(())
    }

    async fn recent(&self, key: &HistoryKey, limit: usize) -> Result<Vec<String>, HistoryError> {
        self.check_available()?;
        let lists = self
            .lists
            .read()
            .expect("InMemoryHistoryStore: lists lock poisoned");
        Ok(lists
            .get(key)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
