//! Domain layer containing relay types and pure logic.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, errors)
//! - `chat` - Message codec, channel/history naming, server notices

pub mod chat;
pub mod foundation;
