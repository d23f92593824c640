//! Capability-discovery handshake, run once per new connection.

use std::sync::Arc;

use tracing::info;

use crate::connection::Connection;
use crate::error::Result;
use crate::protocol::{InitializeParams, ListToolsResult};
use crate::registry::Registry;

/// Run the fixed two-step handshake: capability negotiation, then tool
/// discovery. The catalog lands in the registry entry and the connection
/// becomes ready only when both steps succeed.
///
/// On failure the connection stays registered but not ready; retrying is
/// the caller's policy, not ours.
pub async fn run(registry: &Registry, connection: &Arc<Connection>) -> Result<()> {
    // Response content is irrelevant here; only an error matters.
    connection
        .request("initialize", Some(InitializeParams::default()))
        .await?;

    let listed = connection.request("tools/list", None::<()>).await?;
    let result: ListToolsResult = serde_json::from_value(listed)?;

    let tool_count = result.tools.len();
    registry.set_tool_catalog(connection.identity(), result.tools);
    registry.mark_ready(connection.identity());

    info!(identity = %connection.identity(), tools = tool_count, "session initialized");
    Ok(())
}
