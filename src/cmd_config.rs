//! `validate-config` subcommand.

use std::path::Path;

use anyhow::bail;
use tracing::warn;

use panelbridge_config::{Config, ConfigLoader, ConfigValidator};

pub(crate) fn validate_config(path: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let shown = path
        .map(Path::to_path_buf)
        .or_else(|| ConfigLoader::default_path().filter(|p| p.exists()));
    match &shown {
        Some(p) => println!("Configuration: {}", p.display()),
        None => println!("Configuration: built-in defaults"),
    }

    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if !result.is_valid() {
        bail!("configuration has {} error(s)", result.errors.len());
    }
    println!("Configuration is valid");
    Ok(())
}

/// Refuse to run other commands on a configuration with errors.
pub(crate) fn ensure_valid(config: &Config) -> anyhow::Result<()> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if let Some(first) = result.errors.first() {
        bail!(
            "invalid configuration: {}: {} (run validate-config for details)",
            first.path,
            first.message
        );
    }
    Ok(())
}
