//! Request-level failure taxonomy shared by every context.

use thiserror::Error;

use crate::extraction::{ExtractionFailure, FailureKind};
use crate::ids::RequestId;

/// How a content request failed, as seen by the panel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("No content found in the document")]
    ExtractionEmpty,

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Request {request_id} timed out after {after_ms}ms")]
    Timeout { request_id: RequestId, after_ms: u64 },

    #[error("No transport could reach the target context")]
    TransportExhausted,

    #[error("Frame is cross-origin and cannot be read")]
    CrossOriginBlocked,

    #[error("Could not inject the relay into the page: {0}")]
    BrokerInjectionFailed(String),
}

impl PipelineError {
    /// Whether re-issuing the whole request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExtractionEmpty | Self::Timeout { .. } | Self::TransportExhausted
        )
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::BrokerInjectionFailed(_) => {
                "Could not connect to the document. Please reload the page and try again."
                    .to_string()
            }
            Self::ExtractionEmpty => {
                "No content found. Make sure the document has loaded and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<ExtractionFailure> for PipelineError {
    fn from(failure: ExtractionFailure) -> Self {
        match failure.kind {
            FailureKind::Empty => Self::ExtractionEmpty,
            FailureKind::Failed => Self::ExtractionFailed(failure.reason),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
