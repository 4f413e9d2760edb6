//! In-memory duplex connection for tests.
//!
//! [`loopback`] returns the two server-side halves a session runs on, plus
//! a [`LoopbackClient`] that plays the remote peer.
//!
//! ```ignore
//! let (sender, receiver, mut client) = loopback();
//! tokio::spawn(handler.on_connect(sender, receiver, user_id));
//!
//! client.send_text("@bob hi");
//! assert_eq!(client.recv_text().await, Some("ERROR: User is not active".into()));
//! ```

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ports::{FrameReceiver, FrameSender, InboundFrame, TransportError};

/// What the server sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Text(String),
    Close,
}

type ClientEvent = Result<InboundFrame, TransportError>;

/// Create a connected server/client pair.
pub fn loopback() -> (LoopbackSender, LoopbackReceiver, LoopbackClient) {
    let (to_client, from_server) = mpsc::unbounded_channel();
    let (to_server, from_client) = mpsc::unbounded_channel();
    (
        LoopbackSender {
            to_client,
            closed: false,
        },
        LoopbackReceiver { from_client },
        LoopbackClient {
            to_server: Some(to_server),
            from_server,
        },
    )
}

/// Server-side sending half.
#[derive(Debug)]
pub struct LoopbackSender {
    to_client: mpsc::UnboundedSender<ServerFrame>,
    closed: bool,
}

#[async_trait]
impl FrameSender for LoopbackSender {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.to_client
            .send(ServerFrame::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.closed = true;
        self.to_client
            .send(ServerFrame::Close)
            .map_err(|_| TransportError::Closed)
    }
}

/// Server-side receiving half.
#[derive(Debug)]
pub struct LoopbackReceiver {
    from_client: mpsc::UnboundedReceiver<ClientEvent>,
}

#[async_trait]
impl FrameReceiver for LoopbackReceiver {
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError> {
        match self.from_client.recv().await {
            Some(event) => event.map(Some),
            None => Ok(None),
        }
    }
}

/// The remote peer of a loopback connection.
#[derive(Debug)]
pub struct LoopbackClient {
    to_server: Option<mpsc::UnboundedSender<ClientEvent>>,
    from_server: mpsc::UnboundedReceiver<ServerFrame>,
}

impl LoopbackClient {
    fn emit(&self, event: ClientEvent) {
        if let Some(to_server) = &self.to_server {
            // Server half already gone: the frame is lost, as on a real socket.
            let _ = to_server.send(event);
        }
    }

    /// Send a text frame to the server.
    pub fn send_text(&self, text: impl Into<String>) {
        self.emit(Ok(InboundFrame::Text(text.into())));
    }

    /// Send a binary frame to the server.
    pub fn send_binary(&self) {
        self.emit(Ok(InboundFrame::Unsupported));
    }

    /// Make the server's next read fail with a transport error.
    pub fn fail(&self, reason: impl Into<String>) {
        self.emit(Err(TransportError::Failed(reason.into())));
    }

    /// Close the client side. The server reads end-of-stream; frames the
    /// server sends afterwards can still be received.
    pub fn disconnect(&mut self) {
        self.to_server = None;
    }

    /// Next frame from the server, or `None` once the server half is dropped.
    pub async fn recv(&mut self) -> Option<ServerFrame> {
        self.from_server.recv().await
    }

    /// Next frame from the server if it is text.
    pub async fn recv_text(&mut self) -> Option<String> {
        match self.recv().await {
            Some(ServerFrame::Text(text)) => Some(text),
            _ => None,
        }
    }
}
