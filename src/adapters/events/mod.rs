//! Message bus adapters.
//!
//! Adapters implement the `MessageBus` port for different environments:
//!
//! - `InMemoryMessageBus` - In-process broadcast channels for testing
//! - `RedisMessageBus` - Redis `PUBLISH` / `SUBSCRIBE`

mod in_memory;
mod redis;

pub use self::redis::RedisMessageBus;
pub use in_memory::InMemoryMessageBus;
