//! OpenAI provider implementation.

use async_trait::async_trait;
use tracing::{debug, trace};

use panelbridge_protocols::{AiError, AiResponse, CompletionProvider, GenerateRequest};

use crate::api::{ApiErrorBody, ApiMessage, ApiRequest, ApiResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion provider for OpenAI and compatible endpoints.
pub struct OpenAiProvider {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create provider with a custom base URL (for OpenAI-compatible APIs).
    pub fn with_url(api_key: String, base_url: String) -> Self {
        let api_url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
        Self {
            api_key,
            api_url,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, request: &GenerateRequest) -> ApiRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ApiMessage::system(system.clone()));
        }
        messages.push(ApiMessage::user(request.prompt.clone()));
        ApiRequest {
            model: request.model.clone(),
            messages,
            max_tokens: Some(request.max_tokens()),
            temperature: Some(request.temperature()),
        }
    }

    async fn send_request(&self, api_request: &ApiRequest) -> Result<reqwest::Response, AiError> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(api_request)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(AiError::ApiError { status, message });
        }

        Ok(response)
    }
}

fn parse_response(response: ApiResponse) -> Result<AiResponse, AiError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(AiError::EmptyResponse)?;
    Ok(AiResponse { text })
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn id(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: GenerateRequest) -> Result<AiResponse, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NotConfigured("OpenAI API key not set".to_string()));
        }
        let api_request = self.build_request(&request);
        trace!(model = %api_request.model, "chat completion request");
        let response = self.send_request(&api_request).await?;
        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;
        debug!(model = %request.model, choices = api_response.choices.len(), "chat completion done");
        parse_response(api_response)
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
