//! Broker message handling and the tab relay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use panelbridge_config::BrokerConfig;
use panelbridge_protocols::{
    BrokerMessage, BusResponse, Envelope, ResponseBody, Responder, TabId, TabMessage,
};
use panelbridge_relay::{BrokerLink, TransportError};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::docs_api::DocsApiClient;
use crate::error::BrokerError;
use crate::proxy::AiProxy;
use crate::registry::InjectionRegistry;
use crate::tabs::TabHost;

const INBOX_CAPACITY: usize = 64;

/// The privileged context.
pub struct Broker {
    supported_prefix: String,
    settle_delay: Duration,
    tab_timeout: Duration,
    tabs: Arc<dyn TabHost>,
    registry: InjectionRegistry,
    ai: AiProxy,
    docs: Option<DocsApiClient>,
}

impl Broker {
    pub fn new(config: &BrokerConfig, tabs: Arc<dyn TabHost>, ai: AiProxy) -> Self {
        Self {
            supported_prefix: config.supported_url_prefix.clone(),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            tab_timeout: Duration::from_millis(config.tab_call_timeout_ms),
            tabs,
            registry: InjectionRegistry::new(),
            ai,
            docs: None,
        }
    }

    pub fn with_docs_api(mut self, docs: DocsApiClient) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn registry(&self) -> &InjectionRegistry {
        &self.registry
    }

    pub fn ai(&self) -> &AiProxy {
        &self.ai
    }

    /// Deliver `message` to the relay node in `tab` (the active tab when
    /// `None`), injecting the node first if it is not there.
    pub async fn relay(
        &self,
        tab: Option<TabId>,
        message: TabMessage,
    ) -> Result<BusResponse, BrokerError> {
        let tab = match tab {
            Some(tab) => tab,
            None => self.tabs.active_tab().await.ok_or(BrokerError::NoActiveTab)?,
        };

        let known = self.registry.is_injected(tab);
        if known || self.ping(tab).await {
            self.registry.mark_injected(tab);
            match self.tabs.send(tab, message.clone(), self.tab_timeout).await {
                Ok(response) => return Ok(response),
                // The page may have reloaded since it was registered; only a
                // dead ping proves it.
                Err(e) if known && !self.ping(tab).await => {
                    warn!(%tab, error = %e, "Registered relay is gone, re-injecting");
                    self.registry.forget(tab);
                }
                Err(e) => {
                    return Err(BrokerError::Tab {
                        tab,
                        reason: e.to_string(),
                    })
                }
            }
        }

        self.inject(tab).await?;
        tokio::time::sleep(self.settle_delay).await;
        self.tabs
            .send(tab, message, self.tab_timeout)
            .await
            .map_err(|e| BrokerError::InjectionFailed {
                tab,
                reason: format!("no answer after injection: {e}"),
            })
    }

    async fn ping(&self, tab: TabId) -> bool {
        match self.tabs.send(tab, TabMessage::Ping, self.tab_timeout).await {
            Ok(response) => response.success,
            Err(e) => {
                debug!(%tab, error = %e, "Relay not present");
                false
            }
        }
    }

    async fn inject(&self, tab: TabId) -> Result<(), BrokerError> {
        let url = self.tabs.tab_url(tab).await.unwrap_or_default();
        if !url.starts_with(&self.supported_prefix) {
            return Err(BrokerError::UnsupportedPage(url));
        }
        self.tabs
            .inject(tab)
            .await
            .map_err(|reason| BrokerError::InjectionFailed { tab, reason })?;
        self.registry.mark_injected(tab);
        info!(%tab, "Injected relay node");
        Ok(())
    }

    /// Handle one message and consume its responder.
    pub async fn handle(&self, message: BrokerMessage, responder: Responder) {
        responder.respond(self.dispatch(message).await);
    }

    /// Handle a raw `{ type, data }` message.
    pub async fn handle_raw(&self, raw: Value) -> BusResponse {
        match serde_json::from_value::<BrokerMessage>(raw) {
            Ok(message) => self.dispatch(message).await,
            Err(e) if e.to_string().contains("unknown variant") => {
                BusResponse::err(BrokerError::UnknownMessage.to_string())
            }
            Err(e) => BusResponse::err(format!("Invalid message: {e}")),
        }
    }

    pub async fn dispatch(&self, message: BrokerMessage) -> BusResponse {
        let kind = message.type_name();
        debug!(kind, "Broker received message");
        let result = match message {
            BrokerMessage::CheckModelServer { base_url } => {
                let connected = self.ai.check_connection(base_url).await;
                Ok(BusResponse::ok_with(json!({ "isConnected": connected })))
            }
            BrokerMessage::ListModels { base_url } => self
                .ai
                .list_models(base_url)
                .await
                .map(|models| BusResponse::ok_with(json!({ "models": models })))
                .map_err(BrokerError::from),
            BrokerMessage::ValidateModel { model, base_url } => {
                Ok(BusResponse::ok_with(self.ai.validate_model(&model, base_url).await))
            }
            BrokerMessage::Generate(request) => self
                .ai
                .generate(request)
                .await
                .map(|response| BusResponse::ok_with(response))
                .map_err(BrokerError::from),
            BrokerMessage::FetchDocument { doc_id } => self.fetch_document(&doc_id).await,
            BrokerMessage::GetDocumentContent => self.document_content().await,
            BrokerMessage::RelayDocumentContent => {
                self.relay(None, TabMessage::RelayDocumentContent).await
            }
            BrokerMessage::ForwardToTab { tab_id, message } => self.relay(tab_id, message).await,
            BrokerMessage::ToggleSidebar => self.relay(None, TabMessage::ToggleSidebar).await,
            BrokerMessage::AnalyzeDocument => self.relay(None, TabMessage::AnalyzeDocument).await,
        };

        result.unwrap_or_else(|e| {
            error!(kind, error = %e, "Broker request failed");
            BusResponse::err(e.user_message())
        })
    }

    async fn fetch_document(&self, doc_id: &str) -> Result<BusResponse, BrokerError> {
        let docs = self
            .docs
            .as_ref()
            .ok_or_else(|| BrokerError::DocsApi("document API not configured".to_string()))?;
        let content = docs.fetch_document(doc_id).await?;
        Ok(BusResponse::ok_with(json!({ "content": content })))
    }

    async fn document_content(&self) -> Result<BusResponse, BrokerError> {
        let response = self
            .relay(None, TabMessage::GetDocumentContent { request_id: None })
            .await?;
        let content = response
            .data_as::<ResponseBody>()
            .and_then(|body| body.content)
            .filter(|c| response.success && !c.is_empty());
        Ok(match content {
            Some(content) => BusResponse::ok_with(json!({ "content": content })),
            None => BusResponse::err(
                response
                    .error
                    .unwrap_or_else(|| "Failed to retrieve document content".to_string()),
            ),
        })
    }

    /// Run the broker as a task with its own inbox.
    pub fn spawn(self: Arc<Self>) -> (BrokerHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<(BrokerMessage, Responder)>(INBOX_CAPACITY);
        let handle = tokio::spawn(async move {
            while let Some((message, responder)) = rx.recv().await {
                let broker = self.clone();
                tokio::spawn(async move { broker.handle(message, responder).await });
            }
            info!("Broker stopped");
        });
        (BrokerHandle { tx }, handle)
    }
}

/// Sends [`BrokerMessage`]s to a running broker.
#[derive(Debug, Clone)]
pub struct BrokerHandle {
    tx: mpsc::Sender<(BrokerMessage, Responder)>,
}

impl BrokerHandle {
    pub async fn request(&self, message: BrokerMessage) -> Result<BusResponse, TransportError> {
        let (responder, rx) = Responder::channel(message.type_name());
        self.tx
            .send((message, responder))
            .await
            .map_err(|_| TransportError::Broker("broker is not running".to_string()))?;
        rx.await
            .map_err(|_| TransportError::Broker("broker dropped the request".to_string()))
    }
}

/// Last transport step: carry a frame message to a tab through the broker.
pub struct BrokerRoute {
    broker: BrokerHandle,
    tab: Option<TabId>,
}

impl BrokerRoute {
    /// Route to the active tab.
    pub fn new(broker: BrokerHandle) -> Self {
        Self { broker, tab: None }
    }

    pub fn to_tab(broker: BrokerHandle, tab: TabId) -> Self {
        Self {
            broker,
            tab: Some(tab),
        }
    }
}

#[async_trait]
impl BrokerLink for BrokerRoute {
    async fn forward(&self, envelope: Envelope) -> Result<(), TransportError> {
        let response = self
            .broker
            .request(BrokerMessage::ForwardToTab {
                tab_id: self.tab,
                message: TabMessage::DeliverFrame(envelope),
            })
            .await?;
        if response.success {
            Ok(())
        } else {
            Err(TransportError::Broker(response.error.unwrap_or_default()))
        }
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
