//! Relay errors.

use panelbridge_protocols::{ExtractionFailure, FrameId, PipelineError, RequestId};
use thiserror::Error;

/// A single delivery attempt (or every one of them) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Frame {0} is no longer listening")]
    Closed(FrameId),

    #[error("No frame matched {0}")]
    NoTarget(String),

    #[error("Broker relay failed: {0}")]
    Broker(String),

    #[error("Every transport step failed")]
    Exhausted,
}

/// A correlated request did not produce text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("Request {request_id} timed out after {after_ms}ms")]
    Timeout { request_id: RequestId, after_ms: u64 },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Extraction failed: {0}")]
    Extraction(ExtractionFailure),

    #[error("Request {0} was abandoned before a response arrived")]
    Abandoned(RequestId),
}

impl From<RequestError> for PipelineError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Timeout {
                request_id,
                after_ms,
            } => PipelineError::Timeout {
                request_id,
                after_ms,
            },
            RequestError::Transport(_) => PipelineError::TransportExhausted,
            RequestError::Extraction(failure) => PipelineError::from(failure),
            RequestError::Abandoned(id) => {
                PipelineError::ExtractionFailed(format!("request {id} abandoned"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Closed(FrameId::new("panel"));
        assert!(err.to_string().contains("panel"));
        assert!(TransportError::Exhausted.to_string().contains("Every transport step"));
    }

    #[test]
    fn test_request_error_into_pipeline() {
        let timeout = RequestError::Timeout {
            request_id: RequestId::from("r"),
            after_ms: 100,
        };
        assert!(matches!(
            PipelineError::from(timeout),
            PipelineError::Timeout { after_ms: 100, .. }
        ));
        assert_eq!(
            PipelineError::from(RequestError::Transport(TransportError::Exhausted)),
            PipelineError::TransportExhausted
        );
        assert_eq!(
            PipelineError::from(RequestError::Extraction(ExtractionFailure::empty())),
            PipelineError::ExtractionEmpty
        );
    }
}
