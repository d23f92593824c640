//! Transport seam between a connection and its remote peer.
//!
//! A transport moves framed text messages in both directions. The two
//! halves separate at registration time: the connection keeps the sink for
//! outbound requests while the dispatcher's read loop consumes the stream.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Failure writing a frame to the remote.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Outbound half: writes framed text messages to the remote.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;
}

/// Inbound half: yields framed text messages until the remote closes.
///
/// Read failures are terminal for a connection, so implementations map
/// them to `None` (after logging what they know).
#[async_trait]
pub trait FrameStream: Send {
    async fn next(&mut self) -> Option<String>;
}

/// An accepted transport, ready to be attached to the registry.
pub struct Transport {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

impl Transport {
    pub fn new(
        sink: impl FrameSink + 'static,
        stream: impl FrameStream + 'static,
    ) -> Self {
        Self {
            sink: Box::new(sink),
            stream: Box::new(stream),
        }
    }

    /// In-memory transport pair: frames sent on one end arrive on the
    /// other. Dropping an end closes the peer's stream.
    pub fn pair() -> (Transport, Transport) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Transport::new(ChannelSink(a_tx), ChannelStream(a_rx)),
            Transport::new(ChannelSink(b_tx), ChannelStream(b_rx)),
        )
    }
}

struct ChannelSink(mpsc::UnboundedSender<String>);

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.0
            .send(frame)
            .map_err(|_| TransportError("peer closed".to_string()))
    }
}

struct ChannelStream(mpsc::UnboundedReceiver<String>);

#[async_trait]
impl FrameStream for ChannelStream {
    async fn next(&mut self) -> Option<String> {
        self.0.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_delivers_frames_both_ways() {
        let (mut a, mut b) = Transport::pair();
        a.sink.send("ping".to_string()).await.unwrap();
        assert_eq!(b.stream.next().await.as_deref(), Some("ping"));

        b.sink.send("pong".to_string()).await.unwrap();
        assert_eq!(a.stream.next().await.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn dropping_an_end_closes_the_peer() {
        let (a, mut b) = Transport::pair();
        drop(a);
        assert!(b.stream.next().await.is_none());
        assert!(b.sink.send("late".to_string()).await.is_err());
    }
}
