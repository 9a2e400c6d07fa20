//! Panel errors.

use panelbridge_protocols::{PipelineError, SettingsError};
use panelbridge_relay::RequestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Could not access document content: {0}")]
    Content(PipelineError),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("AI error: {0}")]
    Ai(String),

    #[error("{0}")]
    ModelInvalid(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Could not read suggestions: {0}")]
    Parse(String),
}

impl PanelError {
    /// Whether re-issuing the whole request may help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Content(e) if e.is_retryable())
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Content(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<RequestError> for PanelError {
    fn from(err: RequestError) -> Self {
        Self::Content(PipelineError::from(err))
    }
}

impl From<PipelineError> for PanelError {
    fn from(err: PipelineError) -> Self {
        Self::Content(err)
    }
}
