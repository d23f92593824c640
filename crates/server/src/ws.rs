//! WebSocket-backed transport halves.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use mcp::{FrameSink, FrameStream, Transport, TransportError};
use tracing::debug;

/// Wrap an accepted socket as a connection transport.
pub(crate) fn transport(socket: WebSocket) -> Transport {
    let (sink, stream) = socket.split();
    Transport::new(WsSink(sink), WsStream(stream))
}

struct WsSink(SplitSink<WebSocket, Message>);

#[async_trait]
impl FrameSink for WsSink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.0
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| TransportError(e.to_string()))
    }
}

struct WsStream(SplitStream<WebSocket>);

#[async_trait]
impl FrameStream for WsStream {
    async fn next(&mut self) -> Option<String> {
        while let Some(message) = self.0.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(text.to_string()),
                Ok(Message::Close(_)) => return None,
                // Pings and pongs are answered by axum; binary frames have
                // no meaning on this protocol.
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = %e, "websocket read failed; treating as close");
                    return None;
                }
            }
        }
        None
    }
}
