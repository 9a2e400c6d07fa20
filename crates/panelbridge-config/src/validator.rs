//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_extractor(config, &mut result);
        Self::validate_monitor(config, &mut result);
        Self::validate_relay(config, &mut result);
        Self::validate_broker(config, &mut result);
        Self::validate_ai(config, &mut result);
        Self::validate_panel(config, &mut result);

        Ok(result)
    }

    fn validate_extractor(config: &Config, result: &mut ValidationResult) {
        let ex = &config.extractor;
        if !is_http_url(&ex.supported_url_prefix) {
            result.add_error(ValidationError::new(
                "extractor.supported_url_prefix",
                "supported_url_prefix must start with http:// or https://",
            ));
        }

        if ex.selector_retries > 0 && ex.selector_backoff_ms.is_empty() {
            result.add_warning(ValidationWarning::new(
                "extractor.selector_backoff_ms",
                "No backoff configured, selector retries will run back to back",
            ));
        }

        if ex.probe_global.trim().is_empty() {
            result.add_error(ValidationError::new(
                "extractor.probe_global",
                "probe_global cannot be empty",
            ));
        }
    }

    fn validate_monitor(config: &Config, result: &mut ValidationResult) {
        let m = &config.monitor;
        if m.sample_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "monitor.sample_interval_ms",
                "sample_interval_ms must be greater than 0",
            ));
        }
        if m.reattempt_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "monitor.reattempt_interval_ms",
                "reattempt_interval_ms must be greater than 0",
            ));
        }
        if m.max_reattempts > 200 {
            result.add_warning(ValidationWarning::new(
                "monitor.max_reattempts",
                "max_reattempts is very high (>200), a broken page will be polled for a long time",
            ));
        }
    }

    fn validate_relay(config: &Config, result: &mut ValidationResult) {
        let r = &config.relay;
        if r.request_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "relay.request_timeout_ms",
                "request_timeout_ms must be greater than 0",
            ));
        }

        if r.primary_selector.trim().is_empty() {
            result.add_error(ValidationError::new(
                "relay.primary_selector",
                "primary_selector cannot be empty",
            ));
        }

        if !r.strict_origin {
            result.add_warning(ValidationWarning::new(
                "relay.strict_origin",
                "Origin checking is disabled, frame messages from any origin are accepted",
            ));
        }

        for origin in &r.allowed_origins {
            if !origin.contains("://") {
                result.add_error(ValidationError::new(
                    "relay.allowed_origins",
                    format!("Origin '{}' must include a scheme", origin),
                ));
            }
        }
    }

    fn validate_broker(config: &Config, result: &mut ValidationResult) {
        let b = &config.broker;
        if b.tab_call_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "broker.tab_call_timeout_ms",
                "tab_call_timeout_ms must be greater than 0",
            ));
        }
        if b.supported_url_prefix != config.extractor.supported_url_prefix {
            result.add_warning(ValidationWarning::new(
                "broker.supported_url_prefix",
                "Broker and extractor disagree on the supported URL prefix",
            ));
        }
        if !is_http_url(&b.docs_api_base) {
            result.add_error(ValidationError::new(
                "broker.docs_api_base",
                "docs_api_base must start with http:// or https://",
            ));
        }
    }

    fn validate_ai(config: &Config, result: &mut ValidationResult) {
        let ai = &config.ai;
        if !KNOWN_PROVIDERS.contains(&ai.provider.as_str()) {
            result.add_error(ValidationError::new(
                "ai.provider",
                format!(
                    "Unknown provider '{}', valid values: {:?}",
                    ai.provider, KNOWN_PROVIDERS
                ),
            ));
        }

        if ai.provider == "openai" && ai.openai_api_key.is_none() {
            result.add_warning(ValidationWarning::new(
                "ai.openai_api_key",
                "API key is not set, may need to be set via environment variable",
            ));
        }

        for (path, url) in [
            ("ai.ollama_base_url", &ai.ollama_base_url),
            ("ai.openai_base_url", &ai.openai_base_url),
        ] {
            if !is_http_url(url) {
                result.add_error(ValidationError::new(
                    path,
                    "URL must start with http:// or https://",
                ));
            }
        }

        if !(0.0..=2.0).contains(&ai.temperature) {
            result.add_error(ValidationError::new(
                "ai.temperature",
                "temperature must be between 0.0 and 2.0",
            ));
        }
    }

    fn validate_panel(config: &Config, result: &mut ValidationResult) {
        let p = &config.panel;
        if p.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "panel.max_attempts",
                "max_attempts must be greater than 0",
            ));
        }
        if p.content_char_limit == 0 {
            result.add_error(ValidationError::new(
                "panel.content_char_limit",
                "content_char_limit must be greater than 0",
            ));
        }
        if p.request_timeout_ms < config.relay.request_timeout_ms {
            result.add_warning(ValidationWarning::new(
                "panel.request_timeout_ms",
                "Panel gives up before the relay node does",
            ));
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
