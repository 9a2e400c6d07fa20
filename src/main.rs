//! PanelBridge
//!
//! Command-line entry point: runs the extraction pipeline over saved pages
//! and talks to the configured model server.

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use panelbridge_config::{ConfigLoader, LoggingConfig};

mod cli;
mod cmd_ai;
mod cmd_config;
mod cmd_pipeline;

use cli::{Cli, Commands};

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize tracing with console output and, if configured, a daily
/// rolling log file.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = if logging.file {
        let log_dir = PathBuf::from(ConfigLoader::expand_path(&logging.directory));
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("creating log directory {}", log_dir.display()))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("panelbridge")
            .filename_suffix("log")
            .max_log_files(14)
            .build(&log_dir)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Dropping the guard stops the writer thread.
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        // stdout carries command output
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load_or_default(cli.config.as_deref())
        .context("failed to load configuration")?;
    init_tracing(&config.logging)?;
    debug!(path = ?cli.config, "Configuration loaded");
    if !matches!(cli.command, Commands::ValidateConfig) {
        cmd_config::ensure_valid(&config)?;
    }

    match cli.command {
        Commands::Extract {
            html,
            url,
            selection,
        } => cmd_pipeline::extract(&config, &html, &url, selection).await,
        Commands::Pipeline {
            html,
            url,
            selection,
            analyze,
        } => cmd_pipeline::pipeline(&config, &html, &url, selection, analyze).await,
        Commands::CheckServer { base_url } => cmd_ai::check_server(&config, base_url).await,
        Commands::Models { base_url } => cmd_ai::models(&config, base_url).await,
        Commands::ValidateModel { model, base_url } => {
            cmd_ai::validate_model(&config, &model, base_url).await
        }
        Commands::Generate { prompt, model } => cmd_ai::generate(&config, prompt, model).await,
        Commands::ValidateConfig => cmd_config::validate_config(cli.config.as_deref(), &config),
    }
}
