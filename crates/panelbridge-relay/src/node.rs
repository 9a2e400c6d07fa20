//! Host-side relay node: answers extraction requests arriving by frame
//! message or over the extension bus, and forwards control commands to the
//! panel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panelbridge_config::RelayConfig;
use panelbridge_extractor::Extractor;
use panelbridge_protocols::{
    BusResponse, ControlCommand, Envelope, ExtractionKind, FrameId, FrameMessage, RequestId,
    Responder, TabMessage,
};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::bus::{BusHandle, BusRequest};
use crate::frame::FrameHandle;
use crate::transport::TransportChain;

/// Decides which frame messages the node will act on.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    strict: bool,
    panel_id: FrameId,
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new(config: &RelayConfig, panel_id: FrameId) -> Self {
        Self {
            strict: config.strict_origin,
            panel_id,
            allowed: config.allowed_origins.clone(),
        }
    }

    /// Accept everything.
    pub fn permissive(panel_id: FrameId) -> Self {
        Self {
            strict: false,
            panel_id,
            allowed: Vec::new(),
        }
    }

    pub fn admits(&self, envelope: &Envelope) -> bool {
        !self.strict
            || envelope.source == self.panel_id
            || self.allowed.iter().any(|o| o == &envelope.origin)
    }
}

/// Observable node state. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RelayStatus {
    inner: Arc<StatusFlags>,
}

#[derive(Debug, Default)]
struct StatusFlags {
    visible: AtomicBool,
    panel_ready: AtomicBool,
    host_ready: AtomicBool,
}

impl RelayStatus {
    /// Whether the panel is currently shown.
    pub fn is_visible(&self) -> bool {
        self.inner.visible.load(Ordering::SeqCst)
    }

    /// Whether the panel has announced itself.
    pub fn is_panel_ready(&self) -> bool {
        self.inner.panel_ready.load(Ordering::SeqCst)
    }

    /// Whether the host page's editor appeared before the readiness deadline.
    pub fn is_host_ready(&self) -> bool {
        self.inner.host_ready.load(Ordering::SeqCst)
    }

    fn toggle_visible(&self) -> bool {
        !self.inner.visible.fetch_xor(true, Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        self.inner.visible.store(visible, Ordering::SeqCst);
    }
}

/// Addresses of a running node.
#[derive(Debug, Clone)]
pub struct RelayEndpoint {
    /// Frame inbox; what the panel posts into.
    pub frame: FrameHandle,
    /// Bus inbox; what the broker sends to.
    pub bus: BusHandle,
    pub status: RelayStatus,
}

/// The relay node before it is started.
pub struct RelayNode {
    shared: Arc<Shared>,
    ready_selector: String,
    ready_timeout: Duration,
    ready_poll: Duration,
}

struct Shared {
    extractor: Extractor,
    transport: TransportChain,
    policy: OriginPolicy,
    status: RelayStatus,
}

impl RelayNode {
    /// `transport` delivers to the panel and its source is this node's frame.
    pub fn new(
        config: &RelayConfig,
        extractor: Extractor,
        transport: TransportChain,
        panel_id: FrameId,
    ) -> Self {
        Self::with_policy(config, extractor, transport, OriginPolicy::new(config, panel_id))
    }

    pub fn with_policy(
        config: &RelayConfig,
        extractor: Extractor,
        transport: TransportChain,
        policy: OriginPolicy,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                extractor,
                transport,
                policy,
                status: RelayStatus::default(),
            }),
            ready_selector: config.ready_selector.clone(),
            ready_timeout: Duration::from_millis(config.ready_timeout_ms),
            ready_poll: Duration::from_millis(config.ready_poll_ms),
        }
    }

    /// Start the event loop. The loop ends once every handle to both inboxes
    /// has been dropped.
    pub fn spawn(self) -> (RelayEndpoint, JoinHandle<()>) {
        let (frame, frame_rx) = FrameHandle::channel(self.shared.transport.source().clone());
        let (bus, bus_rx) = BusHandle::channel();
        let endpoint = RelayEndpoint {
            frame,
            bus,
            status: self.shared.status.clone(),
        };

        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            shared
                .announce(&self.ready_selector, self.ready_timeout, self.ready_poll)
                .await;
            Shared::run(shared, frame_rx, bus_rx).await;
        });
        (endpoint, handle)
    }
}

impl Shared {
    async fn run(
        this: Arc<Self>,
        mut frame_rx: mpsc::UnboundedReceiver<Envelope>,
        mut bus_rx: mpsc::Receiver<BusRequest>,
    ) {
        let mut frame_open = true;
        let mut bus_open = true;
        while frame_open || bus_open {
            tokio::select! {
                envelope = frame_rx.recv(), if frame_open => match envelope {
                    Some(envelope) => {
                        let this = this.clone();
                        tokio::spawn(async move { this.on_frame(envelope).await });
                    }
                    None => frame_open = false,
                },
                request = bus_rx.recv(), if bus_open => match request {
                    Some((message, responder)) => {
                        let this = this.clone();
                        tokio::spawn(async move { this.on_bus(message, responder).await });
                    }
                    None => bus_open = false,
                },
            }
        }
        this.extractor.shutdown();
        info!("Relay node stopped");
    }

    async fn announce(&self, selector: &str, timeout: Duration, poll: Duration) {
        let found = self.extractor.wait_for_element(selector, timeout, poll).await;
        self.status.inner.host_ready.store(found, Ordering::SeqCst);
        if !found {
            warn!(selector, "Editor never appeared, announcing anyway");
        }
        info!(title = %self.extractor.document_title(), "Relay node ready");
        self.push(ControlCommand::PanelReady.into()).await;
    }

    async fn on_frame(&self, envelope: Envelope) {
        let kind = envelope.message.type_name();
        if !self.policy.admits(&envelope) {
            warn!(kind, source = %envelope.source, origin = %envelope.origin, "Rejected frame message");
            return;
        }
        trace!(kind, source = %envelope.source, "frame message");

        let message = envelope.message;
        if let Some((request_id, kind)) = message.as_request() {
            self.answer(kind, Some(request_id.clone())).await;
            return;
        }
        match message.as_control() {
            Some(ControlCommand::PanelReady) => {
                self.status.inner.panel_ready.store(true, Ordering::SeqCst);
                debug!("Panel announced ready");
            }
            Some(ControlCommand::ToggleVisibility) => {
                let visible = self.status.toggle_visible();
                debug!(visible, "Panel visibility toggled from panel");
            }
            Some(command) => debug!(?command, "Ignoring control command addressed to host"),
            None => debug!(kind, "Ignoring response addressed to host"),
        }
    }

    async fn on_bus(self: Arc<Self>, message: TabMessage, responder: Responder) {
        trace!(kind = message.type_name(), "bus message");
        let response = match message {
            TabMessage::Ping => BusResponse::ok(),
            TabMessage::GetDocumentContent { request_id } => {
                self.reply_content(ExtractionKind::FullContent, request_id).await
            }
            TabMessage::GetSelectedText { request_id } => {
                self.reply_content(ExtractionKind::Selection, request_id).await
            }
            TabMessage::ToggleSidebar => {
                let visible = self.status.toggle_visible();
                BusResponse::ok_with(json!({ "visible": visible }))
            }
            TabMessage::AnalyzeDocument => {
                self.status.set_visible(true);
                self.forward(ControlCommand::StartAnalysis).await
            }
            TabMessage::ReloadSettings => self.forward(ControlCommand::ReloadSettings).await,
            TabMessage::RelayDocumentContent => {
                self.answer(ExtractionKind::FullContent, None).await;
                BusResponse::ok()
            }
            TabMessage::DeliverFrame(envelope) => {
                // Frame delivery is one-way; replies travel on the transport.
                let this = self.clone();
                tokio::spawn(async move { this.on_frame(envelope).await });
                BusResponse::ok()
            }
        };
        responder.respond(response);
    }

    async fn reply_content(
        &self,
        kind: ExtractionKind,
        request_id: Option<RequestId>,
    ) -> BusResponse {
        let outcome = self.extractor.extract(kind).await;
        let message = FrameMessage::response(kind, request_id, &outcome);
        let Some(body) = message.as_response() else {
            return BusResponse::err("malformed response");
        };
        match &outcome {
            Ok(_) => BusResponse::ok_with(body),
            Err(failure) => {
                let mut response = BusResponse::ok_with(body);
                response.success = false;
                response.error = Some(failure.reason.clone());
                response
            }
        }
    }

    /// Extract and push the result to the panel.
    async fn answer(&self, kind: ExtractionKind, request_id: Option<RequestId>) {
        let outcome = self.extractor.extract(kind).await;
        if let Err(failure) = &outcome {
            debug!(?kind, reason = %failure, "Extraction produced no text");
        }
        self.push(FrameMessage::response(kind, request_id, &outcome))
            .await;
    }

    async fn forward(&self, command: ControlCommand) -> BusResponse {
        match self.transport.send(command.into()).await {
            Ok(_) => BusResponse::ok(),
            Err(e) => BusResponse::err(e.to_string()),
        }
    }

    async fn push(&self, message: FrameMessage) {
        let kind = message.type_name();
        match self.transport.send(message).await {
            Ok(step) => trace!(kind, ?step, "pushed to panel"),
            Err(e) => error!(kind, error = %e, "Could not reach panel"),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
