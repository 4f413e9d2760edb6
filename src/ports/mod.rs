//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay core and the outside world. Adapters implement these ports.
//!
//! - `MessageBus` / `Subscription` - pub/sub transport keyed by channel
//! - `HistoryStore` - per-user newest-first message list
//! - `FrameSender` / `FrameReceiver` - halves of a client's duplex connection

mod duplex_connection;
mod history_store;
mod message_bus;

pub use duplex_connection::{FrameReceiver, FrameSender, InboundFrame, TransportError};
pub use history_store::{HistoryError, HistoryStore};
pub use message_bus::{BusError, MessageBus, Subscription};
