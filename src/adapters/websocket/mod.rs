//! WebSocket adapters for chat connections.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    GET /ws/:user_id                          │
//! │   ws_handler: validate id, upgrade, split socket             │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ WsFrameSender / WsFrameReceiver
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  ConnectionHandler                           │
//! │   admit via PresenceRegistry → Session (inbound + outbound)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`handler`] - Axum WebSocket upgrade handler and router
//! - [`connection`] - Axum socket halves as `FrameSender` / `FrameReceiver`
//! - [`loopback`] - In-memory connection pair for tests

pub mod connection;
pub mod handler;
pub mod loopback;

pub use connection::{WsFrameReceiver, WsFrameSender};
pub use handler::{websocket_router, ws_handler, WebSocketState};
pub use loopback::{loopback, LoopbackClient, LoopbackReceiver, LoopbackSender, ServerFrame};
