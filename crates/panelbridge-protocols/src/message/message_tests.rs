use super::*;
use crate::extraction::{ExtractionFailure, ExtractionKind, ExtractionRequest, FailureKind};
use crate::ids::{FrameId, RequestId, TabId};
use serde_json::json;

#[test]
fn test_request_wire_format() {
    let req = ExtractionRequest::with_id("r-1", ExtractionKind::FullContent, 5000);
    let msg = FrameMessage::request(&req);
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value, json!({"type": "GET_DOCUMENT_CONTENT", "requestId": "r-1"}));
}

#[test]
fn test_selection_request_parts() {
    let req = ExtractionRequest::with_id("r-2", ExtractionKind::Selection, 5000);
    let msg = FrameMessage::request(&req);
    let (id, kind) = msg.as_request().unwrap();
    assert_eq!(id.as_str(), "r-2");
    assert_eq!(kind, ExtractionKind::Selection);
}

#[test]
fn test_success_response_wire_format() {
    let msg = FrameMessage::response(
        ExtractionKind::FullContent,
        Some(RequestId::from("r-1")),
        &Ok("Hello".to_string()),
    );
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(
        value,
        json!({"type": "DOCUMENT_CONTENT_RESPONSE", "requestId": "r-1", "content": "Hello"})
    );
}

#[test]
fn test_empty_response_carries_error_kind() {
    let msg = FrameMessage::response(
        ExtractionKind::Selection,
        Some(RequestId::from("r-3")),
        &Err(ExtractionFailure::empty()),
    );
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "SELECTED_TEXT_RESPONSE");
    assert_eq!(value["errorKind"], "empty");
    assert_eq!(value["error"], "no content found");
}

#[test]
fn test_response_body_decodes_outcome() {
    let raw = json!({"type": "DOCUMENT_CONTENT_RESPONSE", "requestId": "x", "error": "boom"});
    let msg: FrameMessage = serde_json::from_value(raw).unwrap();
    let body = msg.as_response().unwrap();
    let failure = body.outcome().unwrap_err();
    assert_eq!(failure.kind, FailureKind::Failed);
    assert_eq!(failure.reason, "boom");
}

#[test]
fn test_bare_response_is_empty() {
    let raw = json!({"type": "DOCUMENT_CONTENT_RESPONSE"});
    let msg: FrameMessage = serde_json::from_value(raw).unwrap();
    let body = msg.as_response().unwrap();
    assert!(body.request_id.is_none());
    assert!(body.outcome().unwrap_err().is_empty());
}

#[test]
fn test_control_mapping_roundtrip() {
    for cmd in [
        ControlCommand::ToggleVisibility,
        ControlCommand::StartAnalysis,
        ControlCommand::ReloadSettings,
        ControlCommand::PanelReady,
    ] {
        assert_eq!(FrameMessage::from(cmd).as_control(), Some(cmd));
    }
    assert_eq!(
        FrameMessage::GetDocumentContent {
            request_id: RequestId::from("a")
        }
        .as_control(),
        None
    );
}

#[test]
fn test_unit_frame_message_parses() {
    let msg: FrameMessage = serde_json::from_value(json!({"type": "ANALYZE_DOCUMENT"})).unwrap();
    assert_eq!(msg, FrameMessage::AnalyzeDocument);
    assert_eq!(msg.type_name(), "ANALYZE_DOCUMENT");
}

#[test]
fn test_tab_message_envelope() {
    let value = serde_json::to_value(TabMessage::GetDocumentContent {
        request_id: Some(RequestId::from("q")),
    })
    .unwrap();
    assert_eq!(
        value,
        json!({"type": "GET_DOCUMENT_CONTENT", "data": {"requestId": "q"}})
    );

    let ping: TabMessage = serde_json::from_value(json!({"type": "PING"})).unwrap();
    assert_eq!(ping, TabMessage::Ping);
}

#[test]
fn test_tab_message_deliver_frame() {
    let env = Envelope::new(
        FrameId::new("panel"),
        "chrome-extension://abc",
        FrameMessage::SidebarReady,
    );
    let msg = TabMessage::DeliverFrame(env.clone());
    let text = serde_json::to_string(&msg).unwrap();
    let back: TabMessage = serde_json::from_str(&text).unwrap();
    assert_eq!(back, TabMessage::DeliverFrame(env));
}

#[test]
fn test_broker_message_forward() {
    let raw = json!({
        "type": "FORWARD_TO_TAB",
        "data": {"tabId": 7, "message": {"type": "PING"}}
    });
    let msg: BrokerMessage = serde_json::from_value(raw).unwrap();
    assert_eq!(
        msg,
        BrokerMessage::ForwardToTab {
            tab_id: Some(TabId(7)),
            message: TabMessage::Ping
        }
    );
}

#[test]
fn test_bus_response_data_as() {
    let resp = BusResponse::ok_with(json!({"content": "abc"}));
    assert!(resp.success);
    let data: serde_json::Value = resp.data_as().unwrap();
    assert_eq!(data["content"], "abc");

    let err = BusResponse::err("nope");
    assert!(!err.success);
    assert_eq!(err.data_as::<String>(), None);
}

#[tokio::test]
async fn test_responder_sends_once() {
    let (responder, rx) = Responder::channel("PING");
    responder.respond(BusResponse::ok());
    let resp = rx.await.unwrap();
    assert!(resp.success);
}

#[tokio::test]
async fn test_dropped_responder_sends_error() {
    let (responder, rx) = Responder::channel("GET_DOCUMENT_CONTENT");
    drop(responder);
    let resp = rx.await.unwrap();
    assert!(!resp.success);
    assert!(resp.error.unwrap().contains("GET_DOCUMENT_CONTENT"));
}
