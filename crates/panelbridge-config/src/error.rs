//! Errors raised while loading `panelbridge.toml`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("${{{0}}} is referenced by the configuration but not set")]
    MissingEnvVar(String),

    #[error("bad environment reference pattern: {0}")]
    EnvPattern(#[from] regex::Error),
}
