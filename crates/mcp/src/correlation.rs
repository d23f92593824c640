//! Pending-request tracking for multiplexed correlated calls.
//!
//! Each in-flight request parks a one-shot slot keyed by its correlation
//! ID. The dispatcher settles exactly one slot per matching response;
//! settlement, expiry, and disconnect are mutually exclusive terminal
//! states.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::protocol::{JsonRpcError, RequestId};

/// Terminal state delivered to a parked request.
#[derive(Debug)]
pub(crate) enum Settlement {
    /// Result payload from the matching response.
    Result(Value),
    /// Protocol-level error object from the matching response.
    Error(JsonRpcError),
    /// The transport closed while the request was in flight.
    Disconnected,
}

#[derive(Default)]
pub(crate) struct PendingRequests {
    slots: Mutex<HashMap<RequestId, oneshot::Sender<Settlement>>>,
}

impl PendingRequests {
    /// Park a new request. The caller must have generated a fresh ID;
    /// awaiting the returned receiver suspends until settlement.
    pub fn park(&self, id: RequestId) -> oneshot::Receiver<Settlement> {
        let (tx, rx) = oneshot::channel();
        self.slots.lock().unwrap().insert(id, tx);
        rx
    }

    /// Settle the request with the given ID. Returns `false` when no such
    /// request is pending (late or duplicate delivery) — not an error.
    pub fn settle(&self, id: &RequestId, settlement: Settlement) -> bool {
        match self.slots.lock().unwrap().remove(id) {
            // A dropped receiver (caller timed out between our lookup and
            // its cleanup) is indistinguishable from a late delivery.
            Some(slot) => slot.send(settlement).is_ok(),
            None => false,
        }
    }

    /// Remove a request without settling it (timeout cleanup).
    pub fn forget(&self, id: &RequestId) {
        self.slots.lock().unwrap().remove(id);
    }

    /// Reject every pending request; used when the transport closes and no
    /// further response can arrive.
    pub fn abort_all(&self) {
        let drained: Vec<_> = {
            let mut slots = self.slots.lock().unwrap();
            slots.drain().collect()
        };
        for (_, slot) in drained {
            let _ = slot.send(Settlement::Disconnected);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}
