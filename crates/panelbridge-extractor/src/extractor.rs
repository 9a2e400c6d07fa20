//! The host-context extractor.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use panelbridge_config::{ExtractorConfig, MonitorConfig};
use panelbridge_protocols::{
    ExtractionFailure, ExtractionKind, ExtractionOutcome, ExtractionRequest, ExtractionResult,
    HostDocument, RetryPolicy,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::chain::{Pass, StrategyChain};
use crate::monitor::{DiagnosticSnapshot, HealthProbe, MonitorHandle, MonitorSettings};
use crate::strategy::PRIMARY_SELECTOR;

pub const UNTITLED_DOCUMENT: &str = "Untitled Document";

const TITLE_SELECTOR: &str = ".docs-title-input";
const EDITOR_SELECTOR: &str = ".kix-appview-editor";
const NOT_SUPPORTED: &str = "not a supported document";

/// Extraction health as tracked by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthState {
    pub last_success_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub monitoring_active: bool,
}

/// Builder for [`Extractor`].
pub struct ExtractorBuilder {
    document: Arc<dyn HostDocument>,
    config: ExtractorConfig,
    chain: Option<StrategyChain>,
    monitor: MonitorSettings,
    diagnostics: Option<mpsc::UnboundedSender<DiagnosticSnapshot>>,
}

impl ExtractorBuilder {
    pub fn new(document: Arc<dyn HostDocument>) -> Self {
        Self {
            document,
            config: ExtractorConfig::default(),
            chain: None,
            monitor: MonitorSettings::default(),
            diagnostics: None,
        }
    }

    pub fn config(mut self, config: &ExtractorConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn monitor(mut self, settings: MonitorSettings) -> Self {
        self.monitor = settings;
        self
    }

    /// Replace the standard chain.
    pub fn chain(mut self, chain: StrategyChain) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Also deliver diagnostic snapshots to `tx`.
    pub fn diagnostics(mut self, tx: mpsc::UnboundedSender<DiagnosticSnapshot>) -> Self {
        self.diagnostics = Some(tx);
        self
    }

    pub fn build(self) -> Extractor {
        let chain = self
            .chain
            .unwrap_or_else(|| StrategyChain::standard(&self.config));
        let attempts = self.config.selector_retries.saturating_add(1);
        let selector_retry = RetryPolicy::from_millis(attempts, &self.config.selector_backoff_ms);
        let monitor = MonitorHandle::new(self.monitor, self.diagnostics);

        let inner = Arc::new_cyclic(|this| Inner {
            document: self.document,
            chain,
            config: self.config,
            selector_retry,
            health: Mutex::new(HealthState::default()),
            monitor,
            this: this.clone(),
        });
        Extractor { inner }
    }
}

/// Reads text out of the host document. Cheap to clone.
#[derive(Clone)]
pub struct Extractor {
    inner: Arc<Inner>,
}

struct Inner {
    document: Arc<dyn HostDocument>,
    chain: StrategyChain,
    config: ExtractorConfig,
    selector_retry: RetryPolicy,
    health: Mutex<HealthState>,
    monitor: MonitorHandle,
    this: Weak<Inner>,
}

impl Extractor {
    /// Standard chain with the given settings.
    pub fn new(
        document: Arc<dyn HostDocument>,
        config: &ExtractorConfig,
        monitor: &MonitorConfig,
    ) -> Self {
        ExtractorBuilder::new(document)
            .config(config)
            .monitor(MonitorSettings::from(monitor))
            .build()
    }

    pub fn builder(document: Arc<dyn HostDocument>) -> ExtractorBuilder {
        ExtractorBuilder::new(document)
    }

    pub fn document(&self) -> &Arc<dyn HostDocument> {
        &self.inner.document
    }

    pub fn chain(&self) -> &StrategyChain {
        &self.inner.chain
    }

    pub async fn extract(&self, kind: ExtractionKind) -> ExtractionOutcome {
        match kind {
            ExtractionKind::FullContent => self.inner.extract_full().await,
            ExtractionKind::Selection => self.inner.selection(),
        }
    }

    /// Extract and pair the outcome with the request's id.
    pub async fn extract_request(&self, request: &ExtractionRequest) -> ExtractionResult {
        ExtractionResult {
            request_id: request.request_id.clone(),
            outcome: self.extract(request.kind).await,
        }
    }

    pub fn health(&self) -> HealthState {
        let mut state = self.inner.health.lock().clone();
        state.monitoring_active = self.inner.monitor.is_active();
        state
    }

    pub fn diagnostic_snapshot(&self) -> DiagnosticSnapshot {
        self.inner.snapshot()
    }

    pub fn is_supported_document(&self) -> bool {
        self.inner.is_supported(&self.inner.document.url())
    }

    /// Document title, or [`UNTITLED_DOCUMENT`].
    pub fn document_title(&self) -> String {
        self.inner
            .document
            .query_all(TITLE_SELECTOR)
            .iter()
            .filter_map(|n| n.text())
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(String::from)
            .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string())
    }

    /// Poll until `selector` matches or `timeout` elapses.
    pub async fn wait_for_element(&self, selector: &str, timeout: Duration, poll: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.inner.document.query_all(selector).is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                debug!(selector, ?timeout, "Element did not appear");
                return false;
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Stop the health monitor if it is running.
    pub fn shutdown(&self) {
        self.inner.monitor.stop();
    }
}

impl Inner {
    fn is_supported(&self, url: &str) -> bool {
        url.starts_with(&self.config.supported_url_prefix)
    }

    async fn extract_full(&self) -> ExtractionOutcome {
        let doc = self.document.as_ref();
        let url = doc.url();
        if !self.is_supported(&url) {
            warn!(url = %url, "Extraction requested outside a supported document");
            return Err(ExtractionFailure::failed(NOT_SUPPORTED));
        }

        let mut report = self.chain.run(doc, Pass::Full).await;
        let mut attempt = 1;
        while report.text.is_none() && attempt < self.selector_retry.max_attempts {
            let delay = self.selector_retry.delay_after(attempt - 1);
            debug!(retry = attempt, ?delay, "Retrying structural selectors");
            tokio::time::sleep(delay).await;
            report = self.chain.run(doc, Pass::StructuralOnly).await;
            attempt += 1;
        }

        match report.text {
            Some(text) => {
                info!(
                    strategy = report.winner.as_deref().unwrap_or_default(),
                    len = text.len(),
                    "Document content extracted"
                );
                self.record_success();
                Ok(text)
            }
            None => {
                warn!(attempted = ?report.attempted, "No strategy produced content");
                self.record_failure();
                Err(ExtractionFailure::empty())
            }
        }
    }

    fn selection(&self) -> ExtractionOutcome {
        match self.document.selection() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ExtractionFailure::empty()),
        }
    }

    fn record_success(&self) {
        {
            let mut health = self.health.lock();
            health.consecutive_failures = 0;
            health.last_success_at = Some(Utc::now());
        }
        self.monitor.stop();
    }

    fn record_failure(&self) {
        let failures = {
            let mut health = self.health.lock();
            health.consecutive_failures = health.consecutive_failures.saturating_add(1);
            health.consecutive_failures
        };
        debug!(failures, "Extraction failure recorded");
        let probe: Weak<dyn HealthProbe> = self.this.clone();
        self.monitor.start(probe);
    }
}

#[async_trait]
impl HealthProbe for Inner {
    fn snapshot(&self) -> DiagnosticSnapshot {
        let doc = self.document.as_ref();
        let paragraph_count = doc.query_all(PRIMARY_SELECTOR).len();
        DiagnosticSnapshot {
            taken_at: Utc::now(),
            in_document: self.is_supported(&doc.url()),
            paragraph_count,
            body_child_count: doc.body_child_count(),
            has_editor: !doc.query_all(EDITOR_SELECTOR).is_empty(),
            has_content: paragraph_count > 0,
            consecutive_failures: self.health.lock().consecutive_failures,
        }
    }

    async fn reattempt(&self) -> bool {
        self.extract_full().await.is_ok()
    }
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
