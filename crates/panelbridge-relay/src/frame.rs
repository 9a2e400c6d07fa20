//! Frame handles and frame lookup.

use dashmap::DashMap;
use panelbridge_protocols::{Envelope, FrameId};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::TransportError;

/// Posts envelopes into one frame's inbox, like `postMessage` on a window
/// reference. Posting fails once the frame's receiving side is gone.
#[derive(Debug, Clone)]
pub struct FrameHandle {
    id: FrameId,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl FrameHandle {
    /// Create a handle and the inbox it feeds.
    pub fn channel(id: FrameId) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, tx }, rx)
    }

    pub fn id(&self) -> &FrameId {
        &self.id
    }

    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn post(&self, envelope: Envelope) -> Result<(), TransportError> {
        trace!(target_frame = %self.id, kind = envelope.message.type_name(), "post");
        self.tx
            .send(envelope)
            .map_err(|_| TransportError::Closed(self.id.clone()))
    }
}

/// Finds frames the way the host page's DOM would.
pub trait FrameResolver: Send + Sync {
    /// First frame matching a CSS selector.
    fn resolve(&self, selector: &str) -> Option<FrameHandle>;

    fn parent(&self) -> Option<FrameHandle>;

    fn top(&self) -> Option<FrameHandle>;
}

/// In-process [`FrameResolver`] populated by whoever creates the frames.
#[derive(Default)]
pub struct FrameTable {
    by_selector: DashMap<String, FrameHandle>,
    parent: RwLock<Option<FrameHandle>>,
    top: RwLock<Option<FrameHandle>>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, selector: impl Into<String>, handle: FrameHandle) {
        self.by_selector.insert(selector.into(), handle);
    }

    pub fn unregister(&self, selector: &str) -> Option<FrameHandle> {
        self.by_selector.remove(selector).map(|(_, h)| h)
    }

    pub fn set_parent(&self, handle: Option<FrameHandle>) {
        *self.parent.write() = handle;
    }

    pub fn set_top(&self, handle: Option<FrameHandle>) {
        *self.top.write() = handle;
    }
}

impl FrameResolver for FrameTable {
    fn resolve(&self, selector: &str) -> Option<FrameHandle> {
        self.by_selector.get(selector).map(|h| h.clone())
    }

    fn parent(&self) -> Option<FrameHandle> {
        self.parent.read().clone()
    }

    fn top(&self) -> Option<FrameHandle> {
        self.top.read().clone()
    }
}
