//! Redis-backed history store.
//!
//! Each user's history is a Redis list: `LPUSH` to record, `LRANGE 0 n-1`
//! to read the newest `n`. Nothing here trims the list.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::chat::HistoryKey;
use crate::ports::{HistoryError, HistoryStore};

/// History store over a shared multiplexed Redis connection.
#[derive(Clone)]
pub struct RedisHistoryStore {
    conn: MultiplexedConnection,
}

impl RedisHistoryStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn push(&self, key: &HistoryKey, entry: &str) -> Result<(), HistoryError> {
        let mut conn = self.conn.clone();

        conn.lpush::<_, _, ()>(key.as_str(), entry)
            .await
            .map_err(|e: redis::RedisError| HistoryError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn recent(&self, key: &HistoryKey, limit: usize) -> Result<Vec<String>, HistoryError> {
        // LRANGE 0 -1 would mean "everything".
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
        let mut conn = self.conn.clone();

        let entries: Vec<String> = conn
            .lrange(key.as_str(), 0, stop)
            .await
            .map_err(|e: redis::RedisError| HistoryError::Unavailable(e.to_string()))?;

        Ok(entries)
    }
}

impl std::fmt::Debug for RedisHistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHistoryStore").finish_non_exhaustive()
    }
}
