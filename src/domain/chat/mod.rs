//! Chat domain - message framing, routing names and server notices.
//!
//! Everything here is pure: no I/O, no shared state.

mod message;
mod naming;
mod notice;

pub use message::{decode, encode, validate, Message};
pub use naming::{ChannelName, HistoryKey};
pub use notice::Notice;
