//! Broker errors.

use panelbridge_protocols::{AiError, PipelineError, TabId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("No active tab found")]
    NoActiveTab,

    #[error("Not a supported document: {0}")]
    UnsupportedPage(String),

    #[error("Failed to inject relay into {tab}: {reason}")]
    InjectionFailed { tab: TabId, reason: String },

    #[error("Tab {tab} did not answer: {reason}")]
    Tab { tab: TabId, reason: String },

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Document API error: {0}")]
    DocsApi(String),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Unknown message type")]
    UnknownMessage,
}

impl BrokerError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InjectionFailed { .. } => PipelineError::from(self).user_message(),
            other => other.to_string(),
        }
    }
}

impl From<&BrokerError> for PipelineError {
    fn from(err: &BrokerError) -> Self {
        match err {
            BrokerError::InjectionFailed { reason, .. } => {
                PipelineError::BrokerInjectionFailed(reason.clone())
            }
            BrokerError::NoActiveTab | BrokerError::Tab { .. } => PipelineError::TransportExhausted,
            other => PipelineError::ExtractionFailed(other.to_string()),
        }
    }
}

impl From<BrokerError> for PipelineError {
    fn from(err: BrokerError) -> Self {
        PipelineError::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injection_failure_suggests_reload() {
        let err = BrokerError::InjectionFailed {
            tab: TabId(3),
            reason: "denied".into(),
        };
        assert!(err.to_string().contains("tab-3"));
        assert!(err.user_message().contains("reload the page"));
        assert!(matches!(
            PipelineError::from(err),
            PipelineError::BrokerInjectionFailed(_)
        ));
    }

    #[test]
    fn test_unknown_message_display() {
        assert_eq!(BrokerError::UnknownMessage.to_string(), "Unknown message type");
    }

    #[test]
    fn test_tab_errors_are_transport_failures() {
        assert_eq!(
            PipelineError::from(BrokerError::NoActiveTab),
            PipelineError::TransportExhausted
        );
    }
}
