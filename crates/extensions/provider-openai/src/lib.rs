//! OpenAI-compatible chat completion provider for PanelBridge.

mod api;
mod provider;

pub use provider::{OpenAiProvider, DEFAULT_BASE_URL};
