//! Extraction request/result data model.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RequestId;

/// What the panel wants from the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    /// Entire document text.
    FullContent,
    /// The user's current selection.
    Selection,
}

/// A single panel-issued request for document text.
///
/// Lives until its correlated result arrives or `timeout_ms` elapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub request_id: RequestId,
    pub kind: ExtractionKind,
    pub issued_at: DateTime<Utc>,
    pub timeout_ms: u64,
}

impl ExtractionRequest {
    /// Create a request with a fresh id.
    pub fn new(kind: ExtractionKind, timeout_ms: u64) -> Self {
        Self::with_id(RequestId::new(), kind, timeout_ms)
    }

    /// Create a request with a caller-chosen id.
    pub fn with_id(request_id: impl Into<RequestId>, kind: ExtractionKind, timeout_ms: u64) -> Self {
        Self {
            request_id: request_id.into(),
            kind,
            issued_at: Utc::now(),
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Why an extraction produced no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Every strategy ran and none met its threshold.
    Empty,
    /// An error was caught while extracting.
    Failed,
}

/// Failure half of an [`ExtractionOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub kind: FailureKind,
    pub reason: String,
}

impl ExtractionFailure {
    pub fn empty() -> Self {
        Self {
            kind: FailureKind::Empty,
            reason: "no content found".to_string(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Failed,
            reason: reason.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == FailureKind::Empty
    }
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Text on success, a classified failure otherwise.
pub type ExtractionOutcome = Result<String, ExtractionFailure>;

/// The response correlated with an [`ExtractionRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub request_id: RequestId,
    pub outcome: ExtractionOutcome,
}

impl ExtractionResult {
    pub fn ok(request_id: RequestId, text: impl Into<String>) -> Self {
        Self {
            request_id,
            outcome: Ok(text.into()),
        }
    }

    pub fn err(request_id: RequestId, failure: ExtractionFailure) -> Self {
        Self {
            request_id,
            outcome: Err(failure),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }
}
