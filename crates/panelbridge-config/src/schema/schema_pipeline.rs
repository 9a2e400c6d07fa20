//! Extractor, monitor, relay and broker settings.

use serde::{Deserialize, Serialize};

use super::default_true;

pub const DEFAULT_SUPPORTED_URL_PREFIX: &str = "https://docs.google.com/document/";

fn default_supported_url_prefix() -> String {
    DEFAULT_SUPPORTED_URL_PREFIX.to_string()
}

/// Extraction chain settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Pages outside this prefix fail fast.
    #[serde(default = "default_supported_url_prefix")]
    pub supported_url_prefix: String,

    /// Extra passes over the structural selectors within one extraction.
    #[serde(default = "default_selector_retries")]
    pub selector_retries: u32,

    /// Delays between selector passes; the last entry repeats.
    #[serde(default = "default_selector_backoff_ms")]
    pub selector_backoff_ms: Vec<u64>,

    /// How long an injected probe script gets before its global is read.
    #[serde(default = "default_probe_delay_ms")]
    pub probe_delay_ms: u64,

    /// Minimum length for the text-walk and script-probe strategies.
    #[serde(default = "default_long_text_min_len")]
    pub long_text_min_len: usize,

    /// Window global the probe script writes to.
    #[serde(default = "default_probe_global")]
    pub probe_global: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            supported_url_prefix: default_supported_url_prefix(),
            selector_retries: default_selector_retries(),
            selector_backoff_ms: default_selector_backoff_ms(),
            probe_delay_ms: default_probe_delay_ms(),
            long_text_min_len: default_long_text_min_len(),
            probe_global: default_probe_global(),
        }
    }
}

fn default_selector_retries() -> u32 {
    3
}

fn default_selector_backoff_ms() -> Vec<u64> {
    vec![200, 400, 800]
}

fn default_probe_delay_ms() -> u64 {
    500
}

fn default_long_text_min_len() -> usize {
    101
}

fn default_probe_global() -> String {
    "panelbridgeExtractedContent".to_string()
}

/// Health monitor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum spacing between diagnostic snapshots.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// How often the sampler re-attempts extraction.
    #[serde(default = "default_reattempt_interval_ms")]
    pub reattempt_interval_ms: u64,

    #[serde(default = "default_max_reattempts")]
    pub max_reattempts: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_interval_ms: default_sample_interval_ms(),
            reattempt_interval_ms: default_reattempt_interval_ms(),
            max_reattempts: default_max_reattempts(),
        }
    }
}

fn default_sample_interval_ms() -> u64 {
    5000
}

fn default_reattempt_interval_ms() -> u64 {
    3000
}

fn default_max_reattempts() -> u32 {
    20
}

/// Relay node settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Selector for the panel frame when the cached reference is gone.
    #[serde(default = "default_primary_selector")]
    pub primary_selector: String,

    #[serde(default = "default_fallback_selectors")]
    pub fallback_selectors: Vec<String>,

    /// Only accept frame messages from the panel frame or `allowed_origins`.
    #[serde(default = "default_true")]
    pub strict_origin: bool,

    #[serde(default)]
    pub allowed_origins: Vec<String>,

    /// Element whose appearance marks the page as ready.
    #[serde(default = "default_ready_selector")]
    pub ready_selector: String,

    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            primary_selector: default_primary_selector(),
            fallback_selectors: default_fallback_selectors(),
            strict_origin: true,
            allowed_origins: Vec::new(),
            ready_selector: default_ready_selector(),
            ready_timeout_ms: default_ready_timeout_ms(),
            ready_poll_ms: default_ready_poll_ms(),
        }
    }
}

pub(crate) fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_primary_selector() -> String {
    "#panelbridge-panel iframe".to_string()
}

fn default_fallback_selectors() -> Vec<String> {
    [
        "#panelbridge-panel-frame",
        ".panelbridge-panel-container iframe",
        "iframe[src*='panel.html']",
        "iframe",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_ready_selector() -> String {
    ".kix-appview-editor".to_string()
}

fn default_ready_timeout_ms() -> u64 {
    10_000
}

fn default_ready_poll_ms() -> u64 {
    100
}

/// Privileged broker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Tabs outside this prefix never get the relay injected.
    #[serde(default = "default_supported_url_prefix")]
    pub supported_url_prefix: String,

    /// Wait after injecting before retrying the original message.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Upper bound on any single tab call.
    #[serde(default = "default_tab_call_timeout_ms")]
    pub tab_call_timeout_ms: u64,

    #[serde(default = "default_docs_api_base")]
    pub docs_api_base: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            supported_url_prefix: default_supported_url_prefix(),
            settle_delay_ms: default_settle_delay_ms(),
            tab_call_timeout_ms: default_tab_call_timeout_ms(),
            docs_api_base: default_docs_api_base(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_tab_call_timeout_ms() -> u64 {
    5000
}

fn default_docs_api_base() -> String {
    "https://docs.googleapis.com/v1/documents".to_string()
}
