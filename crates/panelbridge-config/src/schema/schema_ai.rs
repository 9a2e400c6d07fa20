//! AI provider and panel settings.

use serde::{Deserialize, Serialize};

use super::schema_pipeline::default_request_timeout_ms;

/// AI provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// "openai" or "ollama".
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            ollama_base_url: default_ollama_base_url(),
            openai_base_url: default_openai_base_url(),
            openai_api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_system_prompt() -> String {
    "You are a helpful writing assistant. Provide concise, actionable suggestions \
     to improve the user's writing."
        .to_string()
}

/// Panel request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Whole-request attempts (extraction plus transport).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: Vec<u64>,

    /// Content beyond this many characters is cut before prompting.
    #[serde(default = "default_content_char_limit")]
    pub content_char_limit: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            content_char_limit: default_content_char_limit(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> Vec<u64> {
    vec![1000, 2000]
}

fn default_content_char_limit() -> usize {
    2000
}
