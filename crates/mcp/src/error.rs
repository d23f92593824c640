//! Connection and protocol error types.

use crate::protocol::JsonRpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no connection registered for '{0}'")]
    ConnectionNotFound(String),

    #[error("connection '{0}' has not completed its handshake")]
    SessionNotReady(String),

    #[error("request '{method}' timed out after {seconds}s")]
    RequestTimeout { method: String, seconds: u64 },

    #[error("remote returned an error: {0}")]
    Protocol(#[from] JsonRpcError),

    #[error("malformed inbound frame: {0}")]
    Decode(String),

    #[error("connection closed before a response arrived")]
    Disconnected,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to serialize request: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
