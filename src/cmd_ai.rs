//! Model server subcommands.

use std::sync::Arc;

use anyhow::bail;
use tracing::info;

use panelbridge_broker::AiProxy;
use panelbridge_config::{AiConfig, Config};
use panelbridge_protocols::{AiSettings, GenerateRequest, MemorySettingsStore};

/// Settings as the config file describes them.
pub(crate) fn settings_from_config(ai: &AiConfig) -> anyhow::Result<AiSettings> {
    Ok(AiSettings {
        provider: ai.provider.parse()?,
        model: ai.model.clone(),
        api_key: ai.openai_api_key.clone(),
        ollama_base_url: ai.ollama_base_url.clone(),
    })
}

fn proxy(config: &Config) -> anyhow::Result<AiProxy> {
    let settings = settings_from_config(&config.ai)?;
    Ok(AiProxy::new(
        config.ai.clone(),
        Arc::new(MemorySettingsStore::new(settings)),
    ))
}

pub(crate) async fn check_server(config: &Config, base_url: Option<String>) -> anyhow::Result<()> {
    let url = base_url.clone().unwrap_or_else(|| config.ai.ollama_base_url.clone());
    if proxy(config)?.check_connection(base_url).await {
        println!("Connected to {url}");
        Ok(())
    } else {
        bail!("Could not connect to {url}. Please check that Ollama is running.")
    }
}

pub(crate) async fn models(config: &Config, base_url: Option<String>) -> anyhow::Result<()> {
    let models = proxy(config)?.list_models(base_url).await?;
    if models.is_empty() {
        println!("No models installed. Run 'ollama pull <model>' to download one.");
        return Ok(());
    }
    for model in models {
        match model.size {
            Some(size) => println!("{:<40} {:>8.1} GB", model.name, size as f64 / 1e9),
            None => println!("{}", model.name),
        }
    }
    Ok(())
}

pub(crate) async fn validate_model(
    config: &Config,
    model: &str,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    let validation = proxy(config)?.validate_model(model, base_url).await;
    if validation.valid {
        println!("Model \"{model}\" is available");
        Ok(())
    } else {
        bail!(validation.message.unwrap_or_else(|| format!("Model \"{model}\" is not available")))
    }
}

pub(crate) async fn generate(
    config: &Config,
    prompt: String,
    model: Option<String>,
) -> anyhow::Result<()> {
    // Sampling options come from `[ai]` inside the proxy.
    let request = GenerateRequest::new(model.unwrap_or_default(), prompt);
    info!(provider = %config.ai.provider, "Generating");
    let response = proxy(config)?.generate(request).await?;
    println!("{}", response.text);
    Ok(())
}
