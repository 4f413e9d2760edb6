//! Chat Relay - One-to-one real-time messaging over WebSocket.
//!
//! Each connected user holds one WebSocket. Messages addressed to another
//! active user are published on that user's pub/sub channel and appended to
//! their history list.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
