//! Axum WebSocket halves as duplex connection ports.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

use crate::ports::{FrameReceiver, FrameSender, InboundFrame, TransportError};

fn transport_error(e: axum::Error) -> TransportError {
    TransportError::Failed(e.to_string())
}

/// Sending half of an upgraded WebSocket.
pub struct WsFrameSender {
    sink: SplitSink<WebSocket, Message>,
}

impl WsFrameSender {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl FrameSender for WsFrameSender {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink.send(Message::Text(text)).await.map_err(transport_error)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(transport_error)?;
        self.sink.close().await.map_err(transport_error)
    }
}

/// Receiving half of an upgraded WebSocket.
pub struct WsFrameReceiver {
    stream: SplitStream<WebSocket>,
}

impl WsFrameReceiver {
    pub fn new(stream: SplitStream<WebSocket>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl FrameReceiver for WsFrameReceiver {
    async fn next_frame(&mut self) -> Result<Option<InboundFrame>, TransportError> {
        while let Some(result) = self.stream.next().await {
            match result.map_err(transport_error)? {
                Message::Text(text) => return Ok(Some(InboundFrame::Text(text))),
                Message::Binary(_) => return Ok(Some(InboundFrame::Unsupported)),
                // Protocol ping/pong - answered by axum
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => return Ok(None),
            }
        }
        Ok(None)
    }
}
