//! Ollama REST wire types.

use serde::{Deserialize, Serialize};

/// `POST /api/generate` body.
#[derive(Debug, Serialize)]
pub struct GenerateBody {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

/// Non-streaming `/api/generate` reply. Only `response` matters here.
#[derive(Debug, Deserialize)]
pub struct GenerateReply {
    #[serde(default)]
    pub response: Option<String>,
}

/// `GET /api/tags` reply.
#[derive(Debug, Default, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}
