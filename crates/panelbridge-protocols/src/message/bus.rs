//! Extension-bus messages: `{ "type": ..., "data": ... }` requests answered
//! through a single-use [`Responder`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

use super::Envelope;
use crate::ids::{RequestId, TabId};
use crate::provider::GenerateRequest;

/// Messages the broker sends to the relay node living in a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TabMessage {
    /// Liveness probe; answered with success when the relay node is present.
    Ping,
    GetDocumentContent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    GetSelectedText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    ToggleSidebar,
    AnalyzeDocument,
    ReloadSettings,
    /// Extract and push the content to the panel without a request id.
    RelayDocumentContent,
    /// A frame message the broker carries on behalf of another context.
    DeliverFrame(Envelope),
}

impl TabMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::GetDocumentContent { .. } => "GET_DOCUMENT_CONTENT",
            Self::GetSelectedText { .. } => "GET_SELECTED_TEXT",
            Self::ToggleSidebar => "TOGGLE_SIDEBAR",
            Self::AnalyzeDocument => "ANALYZE_DOCUMENT",
            Self::ReloadSettings => "RELOAD_SETTINGS",
            Self::RelayDocumentContent => "RELAY_DOCUMENT_CONTENT",
            Self::DeliverFrame(_) => "DELIVER_FRAME",
        }
    }
}

/// Messages addressed to the privileged broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum BrokerMessage {
    CheckModelServer {
        #[serde(default)]
        base_url: Option<String>,
    },
    ListModels {
        #[serde(default)]
        base_url: Option<String>,
    },
    ValidateModel {
        model: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Generate(GenerateRequest),
    FetchDocument { doc_id: String },
    /// Fetch document content from the active tab's relay node.
    GetDocumentContent,
    RelayDocumentContent,
    ForwardToTab {
        #[serde(default)]
        tab_id: Option<TabId>,
        message: TabMessage,
    },
    ToggleSidebar,
    AnalyzeDocument,
}

impl BrokerMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CheckModelServer { .. } => "CHECK_MODEL_SERVER",
            Self::ListModels { .. } => "LIST_MODELS",
            Self::ValidateModel { .. } => "VALIDATE_MODEL",
            Self::Generate(_) => "GENERATE",
            Self::FetchDocument { .. } => "FETCH_DOCUMENT",
            Self::GetDocumentContent => "GET_DOCUMENT_CONTENT",
            Self::RelayDocumentContent => "RELAY_DOCUMENT_CONTENT",
            Self::ForwardToTab { .. } => "FORWARD_TO_TAB",
            Self::ToggleSidebar => "TOGGLE_SIDEBAR",
            Self::AnalyzeDocument => "ANALYZE_DOCUMENT",
        }
    }
}

/// Bus reply: `{ success, data?, error? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BusResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn ok_with(data: impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                success: true,
                data: Some(value),
                error: None,
            },
            Err(e) => Self::err(format!("failed to encode response: {e}")),
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Decode `data` into `T`. `None` when absent or mistyped.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.data
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Single-use reply handle passed to a bus handler.
///
/// `respond` consumes the responder, so at most one reply is sent. A
/// responder dropped without replying sends an error reply instead, so the
/// caller never waits forever.
#[derive(Debug)]
pub struct Responder {
    tx: Option<oneshot::Sender<BusResponse>>,
    kind: &'static str,
}

impl Responder {
    /// Create a responder and the receiver its reply arrives on.
    pub fn channel(kind: &'static str) -> (Self, oneshot::Receiver<BusResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx), kind }, rx)
    }

    pub fn respond(mut self, response: BusResponse) {
        if let Some(tx) = self.tx.take() {
            // Caller may have stopped waiting.
            let _ = tx.send(response);
        }
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(BusResponse::err(format!(
                "no response from handler for {}",
                self.kind
            )));
        }
    }
}
