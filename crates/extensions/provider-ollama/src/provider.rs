//! Ollama provider implementation.

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use panelbridge_protocols::settings::DEFAULT_OLLAMA_BASE_URL;
use panelbridge_protocols::{
    AiError, AiResponse, CompletionProvider, GenerateRequest, ModelInfo, ModelValidation,
};

use crate::api::{GenerateBody, GenerateOptions, GenerateReply, TagsResponse};

/// Client for one Ollama server.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_BASE_URL)
    }
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_tags(&self) -> Result<TagsResponse, AiError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AiError::ApiError {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))
    }

    /// Whether the server answers its catalog endpoint.
    pub async fn check_connection(&self) -> Result<(), AiError> {
        self.fetch_tags().await.map(|_| ())
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, AiError> {
        let tags = self.fetch_tags().await?;
        debug!(count = tags.models.len(), base_url = %self.base_url, "Listed models");
        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                name: m.name,
                size: m.size,
                modified_at: m.modified_at,
            })
            .collect())
    }

    /// Check `name` against the catalog. Tagged variants (`name:tag`) match
    /// their base name. Never fails; problems come back as a message.
    pub async fn validate_model(&self, name: &str) -> ModelValidation {
        if name.trim().is_empty() {
            return ModelValidation::invalid("Model name is empty. Please select a valid model.");
        }

        let tags = match self.fetch_tags().await {
            Ok(tags) => tags,
            Err(AiError::ApiError { status, message }) => {
                return ModelValidation::invalid(format!(
                    "Ollama server returned {status}: {message}. Please check that Ollama is running."
                ));
            }
            Err(e) => {
                return ModelValidation::invalid(format!("Failed to validate Ollama model: {e}"));
            }
        };

        if tags.models.is_empty() {
            return ModelValidation::invalid(
                "No models found on Ollama server. Please run 'ollama pull <model>' to download a model.",
            );
        }

        let tagged = format!("{name}:");
        if tags
            .models
            .iter()
            .any(|m| m.name == name || m.name.starts_with(&tagged))
        {
            return ModelValidation::valid();
        }

        let available: Vec<&str> = tags.models.iter().map(|m| m.name.as_str()).collect();
        ModelValidation::invalid(format!(
            "Model \"{name}\" not found on Ollama server. Available models: {}",
            available.join(", ")
        ))
    }

    fn build_body(request: &GenerateRequest) -> GenerateBody {
        GenerateBody {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            system: request.system.clone(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature(),
                num_predict: request.max_tokens(),
            },
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<AiResponse, AiError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::build_body(&request);
        trace!(model = %body.model, %url, "generate request");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(status, model = %request.model, "Ollama generate failed");
            return Err(AiError::ApiError { status, message });
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        match reply.response {
            Some(text) if !text.is_empty() => Ok(AiResponse { text }),
            _ => Err(AiError::EmptyResponse),
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
