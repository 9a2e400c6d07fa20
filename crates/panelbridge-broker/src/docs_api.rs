//! Document REST API fallback, used when the page's DOM yields nothing.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::BrokerError;

static DOCUMENT_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/document/d/([a-zA-Z0-9_-]+)").ok());

/// Document id from a document URL.
pub fn extract_document_id(url: &str) -> Option<String> {
    DOCUMENT_ID
        .as_ref()?
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Concatenate every paragraph text run in a document resource.
pub fn flatten_document(document: &Value) -> String {
    let mut content = String::new();
    let Some(elements) = document.pointer("/body/content").and_then(Value::as_array) else {
        return content;
    };
    for element in elements {
        let Some(runs) = element
            .pointer("/paragraph/elements")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for run in runs {
            if let Some(text) = run.pointer("/textRun/content").and_then(Value::as_str) {
                content.push_str(text);
            }
        }
    }
    content
}

/// Supplies OAuth bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String, BrokerError>;
}

/// A fixed token.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, BrokerError> {
        if self.0.is_empty() {
            return Err(BrokerError::Auth("no token configured".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Fetches documents from the REST API.
pub struct DocsApiClient {
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    client: reqwest::Client,
}

impl DocsApiClient {
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
            client: reqwest::Client::new(),
        }
    }

    /// Fetch `doc_id` and flatten it to text. One token request, one HTTP call.
    pub async fn fetch_document(&self, doc_id: &str) -> Result<String, BrokerError> {
        let token = self.tokens.token().await?;
        let url = format!("{}/{}", self.base_url, doc_id);
        debug!(%url, "Fetching document");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| BrokerError::DocsApi(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BrokerError::DocsApi(format!(
                "Document API returned {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        let document: Value = response
            .json()
            .await
            .map_err(|e| BrokerError::DocsApi(e.to_string()))?;
        Ok(flatten_document(&document))
    }
}

#[cfg(test)]
#[path = "docs_api_tests.rs"]
mod tests;
