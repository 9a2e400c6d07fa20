//! CLI definitions for PanelBridge.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// URL given to local HTML snapshots unless `--url` says otherwise.
pub(crate) const DEFAULT_DOCUMENT_URL: &str = "https://docs.google.com/document/d/local/edit";

/// PanelBridge CLI.
#[derive(Parser)]
#[command(name = "panelbridge")]
#[command(about = "Resilient panel-to-document messaging and content acquisition")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long, global = true, env = "PANELBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the extraction chain over a saved HTML page
    Extract {
        /// HTML file to treat as the host document
        html: PathBuf,

        /// Document URL the page was saved from
        #[arg(long, default_value = DEFAULT_DOCUMENT_URL)]
        url: String,

        /// Pretend this text is selected and extract the selection instead
        #[arg(long)]
        selection: Option<String>,
    },

    /// Run panel -> relay node -> extractor in-process over a saved HTML page
    Pipeline {
        /// HTML file to treat as the host document
        html: PathBuf,

        /// Document URL the page was saved from
        #[arg(long, default_value = DEFAULT_DOCUMENT_URL)]
        url: String,

        /// Pretend this text is selected and request the selection
        #[arg(long)]
        selection: Option<String>,

        /// Send the content to the configured model for writing suggestions
        #[arg(long)]
        analyze: bool,
    },

    /// Check that the Ollama server answers
    CheckServer {
        /// Server URL (defaults to the configured one)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List models installed on the Ollama server
    Models {
        /// Server URL (defaults to the configured one)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Check that a model is installed on the Ollama server
    ValidateModel {
        /// Model name, with or without a tag
        model: String,

        /// Server URL (defaults to the configured one)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Generate text with the configured provider
    Generate {
        prompt: String,

        /// Model override
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Load and validate the configuration file
    ValidateConfig,
}
