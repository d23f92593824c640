//! Per-connection inbound read loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::protocol::{self, Inbound};
use crate::registry::Registry;
use crate::transport::FrameStream;

/// Read frames until the transport closes, routing responses to the
/// connection's pending set. Malformed frames are logged and skipped; the
/// connection survives them. On close, every in-flight request is rejected
/// immediately and the registry entry is evicted.
pub async fn run(
    connection: Arc<Connection>,
    mut stream: Box<dyn FrameStream>,
    registry: Arc<Registry>,
) {
    let identity = connection.identity().to_string();

    while let Some(frame) = stream.next().await {
        match protocol::decode(&frame) {
            Ok(Inbound::Response(response)) => {
                let id = response.id.clone();
                if !connection.handle_response(response) {
                    debug!(%identity, %id, "discarding response with no pending request");
                }
            }
            Ok(Inbound::Notification { method, .. }) => {
                info!(%identity, %method, "notification from tool server");
            }
            Ok(Inbound::Request { method, .. }) => {
                warn!(%identity, %method, "dropping inbound request; gangway does not serve calls");
            }
            Err(e) => {
                warn!(%identity, error = %e, "dropping malformed frame");
            }
        }
    }

    connection.abort_pending();
    registry.unregister_connection(&connection);
    info!(%identity, "tool server disconnected");
}
