//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay core to external systems:
//! - `events` - Message bus implementations (in-memory, Redis pub/sub)
//! - `storage` - History store implementations (in-memory, Redis lists)
//! - `websocket` - Duplex connections (axum WebSocket, in-memory loopback)
//! - `http` - REST endpoints and router assembly

pub mod events;
pub mod http;
pub mod storage;
pub mod websocket;

pub use events::{InMemoryMessageBus, RedisMessageBus};
pub use storage::{InMemoryHistoryStore, RedisHistoryStore};
