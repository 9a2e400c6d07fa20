//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

mod schema_ai;
mod schema_pipeline;

pub use schema_ai::*;
pub use schema_pipeline::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub relay: RelayConfig,

    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write a daily-rolling log file.
    #[serde(default)]
    pub file: bool,

    #[serde(default = "default_log_directory")]
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
            directory: default_log_directory(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "~/.panelbridge/logs".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
