//! Settings store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings storage unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}
