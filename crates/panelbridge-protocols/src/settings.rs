//! Provider/model settings and their store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::SettingsError;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Which backend answers generation requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

impl AiProviderKind {
    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Ollama => "llama2",
        }
    }
}

impl std::str::FromStr for AiProviderKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(SettingsError::Invalid(format!("unknown provider '{other}'"))),
        }
    }
}

/// User-editable AI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSettings {
    #[serde(default)]
    pub provider: AiProviderKind,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,
}

fn default_ollama_base_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_string()
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: AiProviderKind::default(),
            model: None,
            api_key: None,
            ollama_base_url: default_ollama_base_url(),
        }
    }
}

impl AiSettings {
    /// Configured model, or the provider default.
    pub fn effective_model(&self) -> &str {
        match self.model.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => self.provider.default_model(),
        }
    }
}

/// Async key/value store holding [`AiSettings`].
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<AiSettings, SettingsError>;
    async fn save(&self, settings: AiSettings) -> Result<(), SettingsError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: RwLock<AiSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: AiSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<AiSettings, SettingsError> {
        Ok(self.inner.read().await.clone())
    }

    async fn save(&self, settings: AiSettings) -> Result<(), SettingsError> {
        *self.inner.write().await = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = AiSettings::default();
        assert_eq!(s.provider, AiProviderKind::OpenAi);
        assert_eq!(s.effective_model(), "gpt-4");
        assert_eq!(s.ollama_base_url, "http://localhost:11434");
    }

    #[test]
    fn test_ollama_default_model() {
        let s = AiSettings {
            provider: AiProviderKind::Ollama,
            model: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(s.effective_model(), "llama2");
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("Ollama".parse::<AiProviderKind>().unwrap(), AiProviderKind::Ollama);
        assert!("claude".parse::<AiProviderKind>().is_err());
        assert_eq!(
            serde_json::to_string(&AiProviderKind::OpenAi).unwrap(),
            "\"openai\""
        );
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySettingsStore::default();
        let mut s = store.load().await.unwrap();
        s.provider = AiProviderKind::Ollama;
        store.save(s.clone()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), s);
    }
}
