//! A logical connection to one remote tool server.

use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

use crate::correlation::{PendingRequests, Settlement};
use crate::error::{Error, Result};
use crate::protocol::{InboundResponse, JsonRpcRequest, RequestId, Tool};
use crate::transport::FrameSink;

/// Default deadline for a correlated request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One remote tool-provider: its outbound transport half, discovered tool
/// catalog, readiness flag, and the pending set for in-flight requests.
///
/// The paired inbound half is owned by the dispatcher task, which settles
/// pending requests as responses arrive.
pub struct Connection {
    identity: String,
    sink: Mutex<Box<dyn FrameSink>>,
    pending: PendingRequests,
    tools: StdMutex<Vec<Tool>>,
    ready: AtomicBool,
    request_timeout: Duration,
}

impl Connection {
    pub(crate) fn new(
        identity: impl Into<String>,
        sink: Box<dyn FrameSink>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            identity: identity.into(),
            sink: Mutex::new(sink),
            pending: PendingRequests::default(),
            tools: StdMutex::new(Vec::new()),
            ready: AtomicBool::new(false),
            request_timeout,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Whether the handshake has completed.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The discovered tool catalog.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.lock().unwrap().clone()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.lock().unwrap().len()
    }

    /// Replace the catalog wholesale; element-wise mutation is never done.
    pub(crate) fn set_tools(&self, tools: Vec<Tool>) {
        *self.tools.lock().unwrap() = tools;
    }

    pub(crate) fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Issue a correlated request and suspend until the matching response
    /// arrives or the deadline passes.
    ///
    /// Any number of requests may be in flight concurrently; responses are
    /// matched purely by correlation ID, so arrival order does not matter.
    pub async fn request<P>(&self, method: &str, params: Option<P>) -> Result<Value>
    where
        P: Serialize,
    {
        let id = RequestId::from(Uuid::new_v4().to_string());
        let mut envelope = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            envelope = envelope.with_params(p);
        }
        let frame = serde_json::to_string(&envelope)?;

        // Park before writing so a fast response cannot race the slot.
        let slot = self.pending.park(id.clone());

        {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(frame).await {
                self.pending.forget(&id);
                return Err(Error::Transport(e.to_string()));
            }
        }

        match timeout(self.request_timeout, slot).await {
            Ok(Ok(Settlement::Result(value))) => Ok(value),
            Ok(Ok(Settlement::Error(error))) => Err(Error::Protocol(error)),
            Ok(Ok(Settlement::Disconnected)) | Ok(Err(_)) => Err(Error::Disconnected),
            Err(_) => {
                self.pending.forget(&id);
                Err(Error::RequestTimeout {
                    method: method.to_string(),
                    seconds: self.request_timeout.as_secs(),
                })
            }
        }
    }

    /// Route a response to its pending request. Returns `false` for an
    /// unknown or already-settled ID (late or duplicate delivery).
    pub(crate) fn handle_response(&self, response: InboundResponse) -> bool {
        let settlement = match response.outcome {
            Ok(value) => Settlement::Result(value),
            Err(error) => Settlement::Error(error),
        };
        self.pending.settle(&response.id, settlement)
    }

    /// Reject every in-flight request; called when the transport closes.
    pub(crate) fn abort_pending(&self) {
        self.pending.abort_all();
    }
}
