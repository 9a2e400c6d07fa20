//! Request/response correlation over fire-and-forget messaging.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use panelbridge_protocols::{
    ExtractionOutcome, ExtractionRequest, FrameMessage, RequestId, ResponseBody,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::RequestError;
use crate::transport::MessageSink;

/// Pending request waiting for its response.
struct PendingRequest {
    tx: oneshot::Sender<ExtractionOutcome>,
    /// Distinguishes re-registrations of the same id.
    generation: u64,
}

/// Pairs each outbound [`ExtractionRequest`] with at most one response.
///
/// An entry exists from just before the request is transmitted until it
/// resolves, times out, or its caller goes away. Responses for unknown ids
/// (duplicates, stragglers after a timeout) are dropped.
#[derive(Default)]
pub struct Correlator {
    pending: Mutex<HashMap<RequestId, PendingRequest>>,
    next_generation: AtomicU64,
}

/// Removes the pending entry when the waiting future ends, however it ends.
struct PendingGuard<'a> {
    correlator: &'a Correlator,
    id: &'a RequestId,
    generation: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.correlator.pending.lock();
        // A newer send under the same id owns the entry now.
        if pending
            .get(self.id)
            .is_some_and(|p| p.generation == self.generation)
        {
            pending.remove(self.id);
        }
    }
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transmit `request` through `sink` and wait for its response.
    pub async fn send(
        &self,
        request: &ExtractionRequest,
        sink: &dyn MessageSink,
    ) -> Result<String, RequestError> {
        let id = &request.request_id;
        let (tx, rx) = oneshot::channel();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        // Registered before transmitting so a fast reply is never missed.
        if self
            .pending
            .lock()
            .insert(id.clone(), PendingRequest { tx, generation })
            .is_some()
        {
            warn!(request_id = %id, "Replacing pending request with duplicate id");
        }
        let _guard = PendingGuard {
            correlator: self,
            id,
            generation,
        };

        trace!(request_id = %id, kind = ?request.kind, "send");
        // One deadline covers delivery and the wait.
        let exchange = async {
            sink.transmit(FrameMessage::request(request)).await?;
            let outcome = rx.await.map_err(|_| RequestError::Abandoned(id.clone()))?;
            Ok::<_, RequestError>(outcome)
        };

        match tokio::time::timeout(request.timeout(), exchange).await {
            Ok(Ok(Ok(text))) => Ok(text),
            Ok(Ok(Err(failure))) => Err(RequestError::Extraction(failure)),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                debug!(request_id = %id, after_ms = request.timeout_ms, "Request timed out");
                Err(RequestError::Timeout {
                    request_id: id.clone(),
                    after_ms: request.timeout_ms,
                })
            }
        }
    }

    /// Settle the pending request `id`. Returns `false` when nothing was waiting.
    pub fn resolve(&self, id: &RequestId, outcome: ExtractionOutcome) -> bool {
        let Some(pending) = self.pending.lock().remove(id) else {
            trace!(request_id = %id, "Dropping response for unknown request");
            return false;
        };
        pending.tx.send(outcome).is_ok()
    }

    /// Route a response body to its waiter. Bodies without an id are ignored.
    pub fn handle_response(&self, body: &ResponseBody) -> bool {
        match &body.request_id {
            Some(id) => self.resolve(id, body.outcome()),
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.lock().contains_key(id)
    }

    /// Abandon every pending request.
    pub fn clear(&self) {
        self.pending.lock().clear();
    }
}

#[cfg(test)]
#[path = "correlator_tests.rs"]
mod tests;
