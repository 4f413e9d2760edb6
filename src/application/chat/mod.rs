//! Chat application services.
//!
//! - [`presence`] - registry of users with an active session
//! - [`session`] - the inbound/outbound flow pair of one connection
//! - [`connection_handler`] - admission and session lifecycle
//! - [`get_history`] - read path for recent messages

pub mod connection_handler;
pub mod get_history;
pub mod presence;
pub mod session;

pub use connection_handler::{ConnectionHandler, SessionOutcome};
pub use get_history::{GetHistoryHandler, GetHistoryQuery};
pub use presence::{PresenceGuard, PresenceRegistry};
pub use session::{Session, SessionEnded, SessionState, DEFAULT_RELAY_TIMEOUT};
