//! Storage Adapters
//!
//! Implementations of the HistoryStore port.
//!
//! ## Available Adapters
//!
//! - **RedisHistoryStore** - Redis lists (`LPUSH` / `LRANGE`)
//! - **InMemoryHistoryStore** - Stores history in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryHistoryStore, RedisHistoryStore};
//!
//! // Production: Redis lists
//! let store = RedisHistoryStore::new(multiplexed_connection);
//!
//! // Testing: in-memory lists
//! let store = InMemoryHistoryStore::new();
//! ```

mod in_memory_history;
mod redis_history;

pub use in_memory_history::InMemoryHistoryStore;
pub use redis_history::RedisHistoryStore;
