//! Duplex connection ports - the two halves of a client connection.
//!
//! A connection is split so the inbound flow can own the receiving half
//! while both flows share the sending half.

use async_trait::async_trait;

/// Errors raised by the connection transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone; nothing more can be sent.
    #[error("Connection closed")]
    Closed,

    /// Any other transport failure.
    #[error("Transport error: {0}")]
    Failed(String),
}

/// One frame received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// A data frame the relay does not speak (binary).
    Unsupported,
}

/// Sending half of a client connection.
#[async_trait]
pub trait FrameSender: Send {
    /// Send one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Close the connection. Closing an already closed connection is not
    /// an error worth reporting and may return `TransportError::Closed`.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Receiving half of a client connection.
#[async_trait]
pub trait FrameReceiver: Send {
    /// Wait for the next data frame.
    ///
    /// Returns `Ok(None)` when the peer closed the connection. Control
    /// frames (ping/pong) are handled by the transport and never surface.
    /// Must be cancel safe.
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError>;
}
