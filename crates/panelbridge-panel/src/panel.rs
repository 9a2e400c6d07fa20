//! The panel context.
//!
//! A [`Panel`] cannot touch the host document. It sends correlated
//! extraction requests through its [`TransportChain`], retries the whole
//! request when the failure is recoverable, and hands the resulting text to
//! the model through the broker.

use std::sync::Arc;

use panelbridge_broker::BrokerHandle;
use panelbridge_config::PanelConfig;
use panelbridge_protocols::{
    AiProviderKind, AiResponse, AiSettings, BrokerMessage, BusResponse, ControlCommand, Envelope,
    ExtractionKind, ExtractionRequest, GenerateRequest, ModelValidation, RetryPolicy,
    SettingsStore,
};
use panelbridge_relay::{Correlator, TransportChain};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::error::PanelError;
use crate::prompt::{chat_prompt, review_prompt, selection_prompt};
use crate::suggestions::{parse_suggestions, WritingSuggestion};

/// Result of a review run.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub suggestions: Vec<WritingSuggestion>,
    /// Model output as received.
    pub raw: String,
    pub model: String,
    /// The input was cut to the configured character limit.
    pub truncated: bool,
}

#[derive(Deserialize)]
struct ContentData {
    content: String,
}

pub struct Panel {
    config: PanelConfig,
    correlator: Arc<Correlator>,
    transport: TransportChain,
    broker: Option<BrokerHandle>,
    store: Arc<dyn SettingsStore>,
    settings: RwLock<AiSettings>,
    retry: RetryPolicy,
}

impl Panel {
    pub fn new(
        config: &PanelConfig,
        transport: TransportChain,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            retry: RetryPolicy::from_millis(config.max_attempts, &config.retry_backoff_ms),
            config: config.clone(),
            correlator: Arc::new(Correlator::new()),
            transport,
            broker: None,
            store,
            settings: RwLock::new(AiSettings::default()),
        }
    }

    pub fn with_broker(mut self, broker: BrokerHandle) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn correlator(&self) -> &Arc<Correlator> {
        &self.correlator
    }

    pub fn transport(&self) -> &TransportChain {
        &self.transport
    }

    /// Settings as of the last reload.
    pub fn settings(&self) -> AiSettings {
        self.settings.read().clone()
    }

    pub async fn reload_settings(&self) -> Result<AiSettings, PanelError> {
        let settings = self.store.load().await?;
        info!(
            provider = ?settings.provider,
            model = settings.effective_model(),
            "Settings loaded"
        );
        *self.settings.write() = settings.clone();
        Ok(settings)
    }

    /// Request document text or the selection from the host, re-issuing the
    /// whole request on recoverable failures.
    pub async fn request_content(&self, kind: ExtractionKind) -> Result<String, PanelError> {
        let timeout_ms = self.config.request_timeout_ms;
        self.retry
            .run(PanelError::is_retryable, |attempt| async move {
                let request = ExtractionRequest::new(kind, timeout_ms);
                debug!(request_id = %request.request_id, ?kind, attempt, "Requesting content");
                self.correlator
                    .send(&request, &self.transport)
                    .await
                    .map_err(|e| {
                        warn!(request_id = %request.request_id, error = %e, "Content request failed");
                        PanelError::from(e)
                    })
            })
            .await
    }

    /// Full document text. Falls back to asking the broker when the frame
    /// path fails for good.
    pub async fn document_content(&self) -> Result<String, PanelError> {
        let err = match self.request_content(ExtractionKind::FullContent).await {
            Ok(content) => return Ok(content),
            Err(e) => e,
        };
        let Some(broker) = &self.broker else {
            return Err(err);
        };

        info!(error = %err, "Frame path failed, asking the broker");
        match broker.request(BrokerMessage::GetDocumentContent).await {
            Ok(resp) if resp.success => match resp.data_as::<ContentData>() {
                Some(data) if !data.content.trim().is_empty() => Ok(data.content),
                _ => Err(PanelError::Broker(
                    "Empty document content received".to_string(),
                )),
            },
            Ok(resp) => {
                warn!(error = ?resp.error, "Broker could not fetch content");
                Err(err)
            }
            Err(e) => {
                warn!(error = %e, "Broker unreachable");
                Err(err)
            }
        }
    }

    /// Document text through the broker's REST fallback.
    pub async fn fetch_via_api(&self, doc_id: &str) -> Result<String, PanelError> {
        let resp = self
            .call(
                BrokerMessage::FetchDocument {
                    doc_id: doc_id.to_string(),
                },
                PanelError::Broker,
            )
            .await?;
        resp.data_as::<ContentData>()
            .map(|d| d.content)
            .ok_or_else(|| PanelError::Broker("Failed to retrieve document content".to_string()))
    }

    /// Review the whole document.
    pub async fn analyze_document(&self) -> Result<Analysis, PanelError> {
        let content = self.document_content().await?;
        if content.trim().is_empty() {
            return Err(PanelError::Broker("Empty document content received".to_string()));
        }
        let limit = self.config.content_char_limit;
        self.review(&content, |provider, text| review_prompt(provider, text, limit))
            .await
    }

    /// Review only the selected text.
    pub async fn review_selection(&self) -> Result<Analysis, PanelError> {
        let selection = self.request_content(ExtractionKind::Selection).await?;
        let limit = self.config.content_char_limit;
        self.review(&selection, |provider, text| selection_prompt(provider, text, limit))
            .await
    }

    /// Free-form question, with whatever document context is at hand.
    pub async fn chat(&self, message: &str) -> Result<String, PanelError> {
        let selection = self.content_once(ExtractionKind::Selection).await;
        let context = self.content_once(ExtractionKind::FullContent).await;
        let prompt = chat_prompt(message, selection.as_deref(), context.as_deref());
        self.generate(prompt).await.map(|r| r.text)
    }

    /// Start consuming the panel's frame inbox. Responses settle pending
    /// requests; control commands come out of the returned receiver.
    pub fn listen(
        self: Arc<Self>,
        mut inbox: mpsc::UnboundedReceiver<Envelope>,
    ) -> (mpsc::UnboundedReceiver<ControlCommand>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(envelope) = inbox.recv().await {
                trace!(source = %envelope.source, kind = envelope.message.type_name(), "recv");
                if let Some(body) = envelope.message.as_response() {
                    if body.request_id.is_none() {
                        debug!("Unsolicited content push");
                    }
                    self.correlator.handle_response(body);
                } else if let Some(command) = envelope.message.as_control() {
                    if command == ControlCommand::ReloadSettings {
                        if let Err(e) = self.reload_settings().await {
                            error!(error = %e, "Failed to reload settings");
                        }
                    }
                    let _ = tx.send(command);
                } else {
                    debug!(kind = envelope.message.type_name(), "Ignoring message");
                }
            }
            self.correlator.clear();
            info!("Panel inbox closed");
        });
        (rx, task)
    }

    async fn content_once(&self, kind: ExtractionKind) -> Option<String> {
        let request = ExtractionRequest::new(kind, self.config.request_timeout_ms);
        match self.correlator.send(&request, &self.transport).await {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                debug!(?kind, error = %e, "No context for chat");
                None
            }
        }
    }

    async fn review(
        &self,
        text: &str,
        build: impl Fn(AiProviderKind, &str) -> String,
    ) -> Result<Analysis, PanelError> {
        let settings = self.settings();
        let model = settings.effective_model().to_string();
        let truncated = text.chars().count() > self.config.content_char_limit;
        if truncated {
            debug!(limit = self.config.content_char_limit, "Content truncated");
        }

        if settings.provider == AiProviderKind::Ollama {
            self.validate_model(&model, &settings).await?;
        }

        let prompt = build(settings.provider, text);
        let raw = self.generate(prompt).await?.text;
        let suggestions = parse_suggestions(&raw)?;
        info!(count = suggestions.len(), %model, "Analysis complete");
        Ok(Analysis {
            suggestions,
            raw,
            model,
            truncated,
        })
    }

    async fn validate_model(&self, model: &str, settings: &AiSettings) -> Result<(), PanelError> {
        let resp = self
            .call(
                BrokerMessage::ValidateModel {
                    model: model.to_string(),
                    base_url: Some(settings.ollama_base_url.clone()),
                },
                PanelError::Ai,
            )
            .await?;
        match resp.data_as::<ModelValidation>() {
            Some(v) if v.valid => Ok(()),
            Some(v) => Err(PanelError::ModelInvalid(
                v.message.unwrap_or_else(|| format!("Model \"{model}\" is not available")),
            )),
            None => Err(PanelError::Ai("malformed validation reply".to_string())),
        }
    }

    async fn generate(&self, prompt: String) -> Result<AiResponse, PanelError> {
        let model = self.settings().effective_model().to_string();
        let resp = self
            .call(
                BrokerMessage::Generate(GenerateRequest::new(model, prompt)),
                PanelError::Ai,
            )
            .await?;
        resp.data_as::<AiResponse>()
            .ok_or_else(|| PanelError::Ai("malformed generate reply".to_string()))
    }

    async fn call(
        &self,
        message: BrokerMessage,
        wrap: fn(String) -> PanelError,
    ) -> Result<BusResponse, PanelError> {
        let broker = self
            .broker
            .as_ref()
            .ok_or_else(|| PanelError::NotConfigured("no broker connection".to_string()))?;
        let kind = message.type_name();
        let resp = broker
            .request(message)
            .await
            .map_err(|e| PanelError::Broker(e.to_string()))?;
        if resp.success {
            Ok(resp)
        } else {
            let reason = resp.error.unwrap_or_else(|| format!("{kind} failed"));
            Err(wrap(reason))
        }
    }
}

#[cfg(test)]
#[path = "panel_tests.rs"]
mod tests;
