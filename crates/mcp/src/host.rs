//! Composition of registry, dispatcher, and handshake.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::connection::{Connection, DEFAULT_REQUEST_TIMEOUT};
use crate::registry::{ConnectionStatus, Registry};
use crate::transport::Transport;
use crate::{dispatcher, handshake};

/// Tunables for the connection core.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Deadline applied to every correlated request.
    pub request_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Entry point for accepted tool-server transports: owns the registry and
/// wires each new transport through registration, the dispatcher task, and
/// the handshake.
pub struct McpHost {
    registry: Arc<Registry>,
    config: HostConfig,
}

impl McpHost {
    pub fn new(config: HostConfig) -> Self {
        Self {
            registry: Arc::new(Registry::new()),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Accept a transport for `identity`: register it (replacing any prior
    /// entry), start its read loop, and run the handshake. A failed
    /// handshake is logged and leaves the connection registered but not
    /// ready; chat against it reports the precondition failure.
    pub async fn attach(&self, identity: impl Into<String>, transport: Transport) -> Arc<Connection> {
        let Transport { sink, stream } = transport;
        let connection = self
            .registry
            .register(identity, sink, self.config.request_timeout);

        tokio::spawn(dispatcher::run(
            connection.clone(),
            stream,
            Arc::clone(&self.registry),
        ));

        if let Err(e) = handshake::run(&self.registry, &connection).await {
            warn!(identity = %connection.identity(), error = %e, "handshake failed; connection not ready");
        }

        connection
    }

    pub fn status(&self, identity: &str) -> Option<ConnectionStatus> {
        self.registry.status(identity)
    }

    pub fn statuses(&self) -> Vec<(String, ConnectionStatus)> {
        self.registry.statuses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    /// Minimal in-process tool server speaking the wire protocol.
    async fn serve_tools(mut transport: Transport) {
        while let Some(frame) = transport.stream.next().await {
            let request: Value = serde_json::from_str(&frame).unwrap();
            let id = request["id"].clone();
            let result = match request["method"].as_str() {
                Some("initialize") => json!({"protocolVersion": "2024-11-05"}),
                Some("tools/list") => json!({"tools": [{"name": "echo"}]}),
                Some("tools/call") => json!({"content": [{"type": "text", "text": "ok"}]}),
                _ => json!({}),
            };
            let reply = json!({"jsonrpc": "2.0", "id": id, "result": result});
            if transport.sink.send(reply.to_string()).await.is_err() {
                break;
            }
        }
    }

    #[tokio::test]
    async fn attach_runs_the_full_accept_flow() {
        let host = McpHost::new(HostConfig::default());
        let (local, remote) = Transport::pair();
        tokio::spawn(serve_tools(remote));

        let connection = host.attach("alpha", local).await;

        assert!(connection.is_ready());
        let status = host.status("alpha").unwrap();
        assert!(status.ready);
        assert_eq!(status.tool_count, 1);

        // The connection is usable for correlated calls afterwards.
        let result = connection
            .request(
                "tools/call",
                Some(json!({"name": "echo", "arguments": {}})),
            )
            .await
            .unwrap();
        assert_eq!(result["content"][0]["text"], "ok");
    }

    #[tokio::test]
    async fn attach_with_mute_remote_leaves_connection_not_ready() {
        let host = McpHost::new(HostConfig {
            request_timeout: Duration::from_millis(20),
        });
        let (local, _remote) = Transport::pair();

        let connection = host.attach("mute", local).await;

        assert!(!connection.is_ready());
        assert!(!host.status("mute").unwrap().ready);
    }
}
