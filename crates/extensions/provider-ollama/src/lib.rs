//! Ollama model server provider for PanelBridge.
//!
//! Besides text generation this exposes the server's health check and model
//! catalog, which the broker proxies for the panel.

mod api;
mod provider;

pub use provider::OllamaProvider;
