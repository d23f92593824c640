//! Registry of live tool-server connections.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::connection::Connection;
use crate::protocol::Tool;
use crate::transport::FrameSink;

/// Health summary for one connection.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConnectionStatus {
    pub ready: bool,
    pub tool_count: usize,
}

/// In-memory map of identity to live connection.
///
/// Owned by the process composition point and shared by handle; no I/O,
/// no persistence. Registration is last-writer-wins: a new transport for
/// an existing identity replaces the old entry outright.
#[derive(Default)]
pub struct Registry {
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a fresh, not-ready connection for `identity`,
    /// replacing any prior entry.
    pub fn register(
        &self,
        identity: impl Into<String>,
        sink: Box<dyn FrameSink>,
        request_timeout: Duration,
    ) -> Arc<Connection> {
        let identity = identity.into();
        let connection = Arc::new(Connection::new(identity.clone(), sink, request_timeout));
        self.connections
            .lock()
            .unwrap()
            .insert(identity, connection.clone());
        connection
    }

    /// Absence is not an error; callers handle `None`.
    pub fn lookup(&self, identity: &str) -> Option<Arc<Connection>> {
        self.connections.lock().unwrap().get(identity).cloned()
    }

    /// Remove the entry for `identity`. No-op if absent.
    pub fn unregister(&self, identity: &str) {
        self.connections.lock().unwrap().remove(identity);
    }

    /// Remove the entry only if it still belongs to `connection`. Under
    /// last-writer-wins registration, a replaced connection's dispatcher
    /// must not evict the replacement when the old transport closes.
    pub(crate) fn unregister_connection(&self, connection: &Arc<Connection>) {
        let mut connections = self.connections.lock().unwrap();
        if let Some(current) = connections.get(connection.identity())
            && Arc::ptr_eq(current, connection)
        {
            connections.remove(connection.identity());
        }
    }

    /// Replace the tool catalog on an existing entry. No-op for an unknown
    /// identity — entries are only ever created through `register`.
    pub fn set_tool_catalog(&self, identity: &str, tools: Vec<Tool>) {
        if let Some(connection) = self.lookup(identity) {
            connection.set_tools(tools);
        }
    }

    /// Mark an existing entry ready. No-op for an unknown identity.
    pub fn mark_ready(&self, identity: &str) {
        if let Some(connection) = self.lookup(identity) {
            connection.mark_ready();
        }
    }

    pub fn status(&self, identity: &str) -> Option<ConnectionStatus> {
        self.lookup(identity).map(|c| ConnectionStatus {
            ready: c.is_ready(),
            tool_count: c.tool_count(),
        })
    }

    /// Status of every connection, sorted by identity.
    pub fn statuses(&self) -> Vec<(String, ConnectionStatus)> {
        let mut out: Vec<_> = self
            .connections
            .lock()
            .unwrap()
            .iter()
            .map(|(identity, c)| {
                (
                    identity.clone(),
                    ConnectionStatus {
                        ready: c.is_ready(),
                        tool_count: c.tool_count(),
                    },
                )
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn len(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DEFAULT_REQUEST_TIMEOUT;
    use crate::transport::Transport;

    fn register(registry: &Registry, identity: &str) -> Arc<Connection> {
        let (local, _remote) = Transport::pair();
        registry.register(identity, local.sink, DEFAULT_REQUEST_TIMEOUT)
    }

    fn tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: None,
            input_schema: serde_json::Value::Null,
        }
    }

    #[test]
    fn register_creates_a_not_ready_entry() {
        let registry = Registry::new();
        let conn = register(&registry, "alpha");
        assert!(!conn.is_ready());
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("alpha").is_some());
    }

    #[test]
    fn lookup_of_unknown_identity_is_none() {
        let registry = Registry::new();
        assert!(registry.lookup("nobody").is_none());
    }

    #[test]
    fn reregistration_replaces_the_entry() {
        let registry = Registry::new();
        let old = register(&registry, "alpha");
        registry.mark_ready("alpha");

        let new = register(&registry, "alpha");
        assert_eq!(registry.len(), 1);
        assert!(!new.is_ready());
        assert!(!Arc::ptr_eq(&registry.lookup("alpha").unwrap(), &old));
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = Registry::new();
        register(&registry, "alpha");
        registry.unregister("alpha");
        registry.unregister("alpha");
        assert!(registry.is_empty());
    }

    #[test]
    fn field_setters_never_create_entries() {
        let registry = Registry::new();
        registry.set_tool_catalog("ghost", vec![tool("search")]);
        registry.mark_ready("ghost");
        assert!(registry.is_empty());
        assert!(registry.status("ghost").is_none());
    }

    #[test]
    fn stale_connection_cannot_evict_its_replacement() {
        let registry = Registry::new();
        let old = register(&registry, "alpha");
        let new = register(&registry, "alpha");

        registry.unregister_connection(&old);
        assert!(Arc::ptr_eq(&registry.lookup("alpha").unwrap(), &new));

        registry.unregister_connection(&new);
        assert!(registry.lookup("alpha").is_none());
    }

    #[test]
    fn statuses_reflect_catalog_and_readiness() {
        let registry = Registry::new();
        register(&registry, "beta");
        register(&registry, "alpha");
        registry.set_tool_catalog("alpha", vec![tool("search"), tool("fetch")]);
        registry.mark_ready("alpha");

        let statuses = registry.statuses();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].0, "alpha");
        assert!(statuses[0].1.ready);
        assert_eq!(statuses[0].1.tool_count, 2);
        assert!(!statuses[1].1.ready);
    }
}
