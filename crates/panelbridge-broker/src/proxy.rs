//! Outbound AI calls made on behalf of the panel.

use std::sync::Arc;

use panelbridge_config::AiConfig;
use panelbridge_protocols::{
    AiError, AiProviderKind, AiResponse, AiSettings, CompletionProvider, GenerateRequest,
    ModelInfo, ModelValidation, SettingsStore,
};
use panelbridge_provider_ollama::OllamaProvider;
use panelbridge_provider_openai::OpenAiProvider;
use tracing::{debug, info, warn};

/// Builds providers from the current settings and forwards requests.
pub struct AiProxy {
    config: AiConfig,
    settings: Arc<dyn SettingsStore>,
}

impl AiProxy {
    pub fn new(config: AiConfig, settings: Arc<dyn SettingsStore>) -> Self {
        Self { config, settings }
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    async fn load_settings(&self) -> Result<AiSettings, AiError> {
        self.settings
            .load()
            .await
            .map_err(|e| AiError::NotConfigured(e.to_string()))
    }

    async fn ollama(&self, base_url: Option<String>) -> OllamaProvider {
        match base_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => OllamaProvider::new(url),
            None => match self.load_settings().await {
                Ok(settings) => OllamaProvider::new(settings.ollama_base_url),
                Err(_) => OllamaProvider::new(self.config.ollama_base_url.clone()),
            },
        }
    }

    pub async fn check_connection(&self, base_url: Option<String>) -> bool {
        let provider = self.ollama(base_url).await;
        match provider.check_connection().await {
            Ok(()) => {
                info!(base_url = %provider.base_url(), "Model server reachable");
                true
            }
            Err(e) => {
                warn!(base_url = %provider.base_url(), error = %e, "Could not connect to model server");
                false
            }
        }
    }

    pub async fn list_models(&self, base_url: Option<String>) -> Result<Vec<ModelInfo>, AiError> {
        self.ollama(base_url).await.list_models().await
    }

    pub async fn validate_model(&self, model: &str, base_url: Option<String>) -> ModelValidation {
        self.ollama(base_url).await.validate_model(model).await
    }

    fn provider_for(&self, settings: &AiSettings) -> Box<dyn CompletionProvider> {
        match settings.provider {
            AiProviderKind::Ollama => Box::new(OllamaProvider::new(settings.ollama_base_url.clone())),
            AiProviderKind::OpenAi => {
                let key = settings
                    .api_key
                    .clone()
                    .filter(|k| !k.is_empty())
                    .or_else(|| self.config.openai_api_key.clone())
                    .unwrap_or_default();
                Box::new(OpenAiProvider::with_url(key, self.config.openai_base_url.clone()))
            }
        }
    }

    /// Generate with the configured provider. An empty model means the
    /// provider default, unset sampling options come from `[ai]`, and hosted
    /// providers get the system prompt.
    pub async fn generate(&self, mut request: GenerateRequest) -> Result<AiResponse, AiError> {
        let settings = self.load_settings().await?;
        if request.model.trim().is_empty() {
            request.model = settings.effective_model().to_string();
        }
        request.temperature.get_or_insert(self.config.temperature);
        request.max_tokens.get_or_insert(self.config.max_tokens);
        if settings.provider == AiProviderKind::OpenAi && request.system.is_none() {
            request.system = Some(self.config.system_prompt.clone());
        }

        let provider = self.provider_for(&settings);
        debug!(provider = provider.id(), model = %request.model, "Generating");
        provider.generate(request).await
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
