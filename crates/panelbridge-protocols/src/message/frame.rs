//! Frame messages and their provenance envelope.

use serde::{Deserialize, Serialize};

use super::ControlCommand;
use crate::extraction::{
    ExtractionFailure, ExtractionKind, ExtractionOutcome, ExtractionRequest, FailureKind,
};
use crate::ids::{FrameId, RequestId};

/// Payload of a content or selection response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl ResponseBody {
    fn from_outcome(request_id: Option<RequestId>, outcome: &ExtractionOutcome) -> Self {
        match outcome {
            Ok(text) => Self {
                request_id,
                content: Some(text.clone()),
                ..Default::default()
            },
            Err(failure) => Self {
                request_id,
                error: Some(failure.reason.clone()),
                error_kind: Some(failure.kind),
                ..Default::default()
            },
        }
    }

    /// Decode back into an outcome. A body with neither content nor error
    /// counts as empty.
    pub fn outcome(&self) -> ExtractionOutcome {
        match (&self.content, &self.error) {
            (_, Some(reason)) => Err(ExtractionFailure {
                kind: self.error_kind.unwrap_or(FailureKind::Failed),
                reason: reason.clone(),
            }),
            (Some(text), None) => Ok(text.clone()),
            (None, None) => Err(ExtractionFailure::empty()),
        }
    }
}

/// Frame-to-frame message, `{ type, requestId?, content?, error? }` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum FrameMessage {
    GetDocumentContent { request_id: RequestId },
    GetSelectedText { request_id: RequestId },
    DocumentContentResponse(ResponseBody),
    SelectedTextResponse(ResponseBody),
    AnalyzeDocument,
    ReloadSettings,
    ToggleSidebar,
    SidebarReady,
}

impl FrameMessage {
    /// Wire form of an extraction request.
    pub fn request(request: &ExtractionRequest) -> Self {
        let request_id = request.request_id.clone();
        match request.kind {
            ExtractionKind::FullContent => Self::GetDocumentContent { request_id },
            ExtractionKind::Selection => Self::GetSelectedText { request_id },
        }
    }

    /// Wire form of an extraction response. `request_id` is `None` for
    /// unsolicited pushes.
    pub fn response(
        kind: ExtractionKind,
        request_id: Option<RequestId>,
        outcome: &ExtractionOutcome,
    ) -> Self {
        let body = ResponseBody::from_outcome(request_id, outcome);
        match kind {
            ExtractionKind::FullContent => Self::DocumentContentResponse(body),
            ExtractionKind::Selection => Self::SelectedTextResponse(body),
        }
    }

    /// Id and kind, if this is a request.
    pub fn as_request(&self) -> Option<(&RequestId, ExtractionKind)> {
        match self {
            Self::GetDocumentContent { request_id } => {
                Some((request_id, ExtractionKind::FullContent))
            }
            Self::GetSelectedText { request_id } => Some((request_id, ExtractionKind::Selection)),
            _ => None,
        }
    }

    /// Response body, if this is a response.
    pub fn as_response(&self) -> Option<&ResponseBody> {
        match self {
            Self::DocumentContentResponse(body) | Self::SelectedTextResponse(body) => Some(body),
            _ => None,
        }
    }

    /// Control command carried by this message, if any.
    pub fn as_control(&self) -> Option<ControlCommand> {
        match self {
            Self::AnalyzeDocument => Some(ControlCommand::StartAnalysis),
            Self::ReloadSettings => Some(ControlCommand::ReloadSettings),
            Self::ToggleSidebar => Some(ControlCommand::ToggleVisibility),
            Self::SidebarReady => Some(ControlCommand::PanelReady),
            _ => None,
        }
    }

    /// Wire `type` string, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GetDocumentContent { .. } => "GET_DOCUMENT_CONTENT",
            Self::GetSelectedText { .. } => "GET_SELECTED_TEXT",
            Self::DocumentContentResponse(_) => "DOCUMENT_CONTENT_RESPONSE",
            Self::SelectedTextResponse(_) => "SELECTED_TEXT_RESPONSE",
            Self::AnalyzeDocument => "ANALYZE_DOCUMENT",
            Self::ReloadSettings => "RELOAD_SETTINGS",
            Self::ToggleSidebar => "TOGGLE_SIDEBAR",
            Self::SidebarReady => "SIDEBAR_READY",
        }
    }
}

impl From<ControlCommand> for FrameMessage {
    fn from(command: ControlCommand) -> Self {
        match command {
            ControlCommand::ToggleVisibility => Self::ToggleSidebar,
            ControlCommand::StartAnalysis => Self::AnalyzeDocument,
            ControlCommand::ReloadSettings => Self::ReloadSettings,
            ControlCommand::PanelReady => Self::SidebarReady,
        }
    }
}

/// A frame message plus the provenance the receiver can check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: FrameId,
    pub origin: String,
    pub message: FrameMessage,
}

impl Envelope {
    pub fn new(source: FrameId, origin: impl Into<String>, message: FrameMessage) -> Self {
        Self {
            source,
            origin: origin.into(),
            message,
        }
    }
}
