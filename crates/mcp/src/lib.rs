//! MCP connection core for gangway.
//!
//! Remote tool servers connect over a framed transport; this crate tracks
//! one logical connection per identity, runs the capability-discovery
//! handshake, and multiplexes concurrent correlated requests over each
//! connection's single transport.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{HostConfig, McpHost, Transport};
//!
//! # async fn example(transport: Transport) -> mcp::Result<()> {
//! let host = McpHost::new(HostConfig::default());
//!
//! // A freshly accepted transport becomes a ready connection once the
//! // initialize and tools/list steps succeed.
//! let connection = host.attach("acme-tools", transport).await;
//! for tool in connection.tools() {
//!     println!("tool: {}", tool.name);
//! }
//!
//! let result = connection
//!     .request("tools/call", Some(serde_json::json!({
//!         "name": "search",
//!         "arguments": {"q": "weather"}
//!     })))
//!     .await?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

mod connection;
mod correlation;
pub mod dispatcher;
mod error;
pub mod handshake;
mod host;
mod protocol;
mod registry;
mod transport;

pub use connection::{Connection, DEFAULT_REQUEST_TIMEOUT};
pub use error::{Error, Result};
pub use host::{HostConfig, McpHost};
pub use protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, Inbound, InboundResponse,
    InitializeParams, JsonRpcError, JsonRpcRequest, ListToolsResult, PROTOCOL_VERSION, RequestId,
    Tool, decode,
};
pub use registry::{ConnectionStatus, Registry};
pub use transport::{FrameSink, FrameStream, Transport, TransportError};
