//! Application layer - Session orchestration and query handlers.
//!
//! This layer coordinates the pure chat domain with the ports: it decides
//! who may connect, runs each session's flows and serves history reads.

pub mod chat;

pub use chat::{
    ConnectionHandler, GetHistoryHandler, GetHistoryQuery, PresenceGuard, PresenceRegistry,
    Session, SessionEnded, SessionOutcome, SessionState,
};
