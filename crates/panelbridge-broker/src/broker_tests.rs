use super::*;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use panelbridge_config::AiConfig;
use panelbridge_protocols::{FrameId, FrameMessage, MemorySettingsStore, PipelineError};
use parking_lot::Mutex;
use tokio::time::Instant;

const DOC_URL: &str = "https://docs.google.com/document/d/abc/edit";

/// Scripted tab: answers only while `present`.
struct FakeTabs {
    active: Option<TabId>,
    url: String,
    present: AtomicBool,
    inject_ok: bool,
    present_after_inject: bool,
    /// Answer pings but let every other message go unanswered.
    stall_messages: AtomicBool,
    injects: AtomicUsize,
    sent: Mutex<Vec<&'static str>>,
}

impl FakeTabs {
    fn new(present: bool) -> Self {
        Self {
            active: Some(TabId(1)),
            url: DOC_URL.to_string(),
            present: AtomicBool::new(present),
            inject_ok: true,
            present_after_inject: true,
            stall_messages: AtomicBool::new(false),
            injects: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<&'static str> {
        self.sent.lock().clone()
    }

    fn injects(&self) -> usize {
        self.injects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TabHost for FakeTabs {
    async fn active_tab(&self) -> Option<TabId> {
        self.active
    }

    async fn tab_url(&self, _tab: TabId) -> Option<String> {
        Some(self.url.clone())
    }

    async fn send(
        &self,
        _tab: TabId,
        message: TabMessage,
        _timeout: Duration,
    ) -> Result<BusResponse, TransportError> {
        self.sent.lock().push(message.type_name());
        if !self.present.load(Ordering::SeqCst) {
            return Err(TransportError::NoTarget("Receiving end does not exist.".into()));
        }
        if self.stall_messages.load(Ordering::SeqCst) && !matches!(message, TabMessage::Ping) {
            return Err(TransportError::NoTarget(format!(
                "no reply to {} within 30000ms",
                message.type_name()
            )));
        }
        Ok(match message {
            TabMessage::GetDocumentContent { .. } => BusResponse::ok_with(ResponseBody {
                content: Some("doc text".into()),
                ..Default::default()
            }),
            other => BusResponse::ok_with(json!({ "echo": other.type_name() })),
        })
    }

    async fn inject(&self, _tab: TabId) -> Result<(), String> {
        self.injects.fetch_add(1, Ordering::SeqCst);
        if !self.inject_ok {
            return Err("Cannot access contents of the page".into());
        }
        self.present
            .store(self.present_after_inject, Ordering::SeqCst);
        Ok(())
    }
}

fn broker(tabs: Arc<FakeTabs>) -> Broker {
    let ai = AiProxy::new(AiConfig::default(), Arc::new(MemorySettingsStore::default()));
    Broker::new(&BrokerConfig::default(), tabs, ai)
}

#[tokio::test]
async fn test_no_active_tab() {
    let tabs = Arc::new(FakeTabs {
        active: None,
        ..FakeTabs::new(true)
    });
    let err = broker(tabs).relay(None, TabMessage::ToggleSidebar).await.unwrap_err();
    assert!(matches!(err, BrokerError::NoActiveTab));
}

#[tokio::test]
async fn test_present_relay_is_pinged_once_then_registered() {
    let tabs = Arc::new(FakeTabs::new(true));
    let broker = broker(tabs.clone());

    broker.relay(None, TabMessage::ToggleSidebar).await.unwrap();
    broker.relay(None, TabMessage::ToggleSidebar).await.unwrap();

    assert_eq!(tabs.sent(), vec!["PING", "TOGGLE_SIDEBAR", "TOGGLE_SIDEBAR"]);
    assert_eq!(tabs.injects(), 0);
    assert!(broker.registry().is_injected(TabId(1)));
}

#[tokio::test(start_paused = true)]
async fn test_absent_relay_injected_then_retried_after_settle() {
    let tabs = Arc::new(FakeTabs::new(false));
    let broker = broker(tabs.clone());

    let started = Instant::now();
    let resp = broker.relay(Some(TabId(1)), TabMessage::AnalyzeDocument).await.unwrap();
    assert!(resp.success);
    assert!(started.elapsed() >= Duration::from_millis(500));

    assert_eq!(tabs.injects(), 1);
    assert_eq!(tabs.sent(), vec!["PING", "ANALYZE_DOCUMENT"]);
    assert!(broker.registry().is_injected(TabId(1)));
}

#[tokio::test]
async fn test_unsupported_page_not_injected() {
    let tabs = Arc::new(FakeTabs {
        url: "https://example.com/".into(),
        ..FakeTabs::new(false)
    });
    let err = broker(tabs.clone())
        .relay(None, TabMessage::ToggleSidebar)
        .await
        .unwrap_err();
    assert!(matches!(err, BrokerError::UnsupportedPage(ref url) if url == "https://example.com/"));
    assert_eq!(tabs.injects(), 0);
}

#[tokio::test]
async fn test_injection_denied() {
    let tabs = Arc::new(FakeTabs {
        inject_ok: false,
        ..FakeTabs::new(false)
    });
    let err = broker(tabs).relay(None, TabMessage::ToggleSidebar).await.unwrap_err();
    assert!(matches!(err, BrokerError::InjectionFailed { .. }));
    assert!(matches!(
        PipelineError::from(err),
        PipelineError::BrokerInjectionFailed(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_retried_exactly_once_after_injection() {
    let tabs = Arc::new(FakeTabs {
        present_after_inject: false,
        ..FakeTabs::new(false)
    });
    let err = broker(tabs.clone())
        .relay(None, TabMessage::ToggleSidebar)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no answer after injection"));
    assert_eq!(tabs.sent(), vec!["PING", "TOGGLE_SIDEBAR"]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_registration_reinjects() {
    let tabs = Arc::new(FakeTabs::new(true));
    let broker = broker(tabs.clone());
    broker.relay(None, TabMessage::Ping).await.unwrap();

    // Page reloaded: the relay is gone but the registry still says present.
    tabs.present.store(false, Ordering::SeqCst);
    broker.relay(None, TabMessage::ToggleSidebar).await.unwrap();
    assert_eq!(tabs.injects(), 1);
}

#[tokio::test]
async fn test_slow_handler_on_live_relay_is_not_reinjected() {
    let tabs = Arc::new(FakeTabs::new(true));
    let broker = broker(tabs.clone());
    broker.registry().mark_injected(TabId(1));

    // The relay still answers pings; only the real message stalls.
    tabs.stall_messages.store(true, Ordering::SeqCst);
    let err = broker
        .relay(None, TabMessage::AnalyzeDocument)
        .await
        .unwrap_err();

    assert!(matches!(err, BrokerError::Tab { tab: TabId(1), .. }), "{err:?}");
    assert_eq!(tabs.injects(), 0);
    assert_eq!(tabs.sent(), vec!["ANALYZE_DOCUMENT", "PING"]);
    assert!(broker.registry().is_injected(TabId(1)));
}

#[tokio::test]
async fn test_dispatch_document_content() {
    let broker = broker(Arc::new(FakeTabs::new(true)));
    let resp = broker.dispatch(BrokerMessage::GetDocumentContent).await;
    assert!(resp.success);
    assert_eq!(resp.data, Some(json!({ "content": "doc text" })));
}

#[tokio::test]
async fn test_dispatch_failure_becomes_error_response() {
    let tabs = Arc::new(FakeTabs {
        active: None,
        ..FakeTabs::new(true)
    });
    let resp = broker(tabs).dispatch(BrokerMessage::AnalyzeDocument).await;
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("No active tab found"));
}

#[tokio::test]
async fn test_fetch_document_without_api() {
    let resp = broker(Arc::new(FakeTabs::new(true)))
        .dispatch(BrokerMessage::FetchDocument {
            doc_id: "abc".into(),
        })
        .await;
    assert!(!resp.success);
}

#[tokio::test]
async fn test_unknown_raw_message() {
    let broker = broker(Arc::new(FakeTabs::new(true)));
    let resp = broker.handle_raw(json!({ "type": "GET_API_KEY" })).await;
    assert_eq!(resp.error.as_deref(), Some("Unknown message type"));

    let resp = broker.handle_raw(json!({ "type": "TOGGLE_SIDEBAR" })).await;
    assert!(resp.success);
}

#[tokio::test]
async fn test_broker_route_delivers_frame() {
    let tabs = Arc::new(FakeTabs::new(true));
    let (handle, _task) = Arc::new(broker(tabs.clone())).spawn();
    let route = BrokerRoute::new(handle);

    let envelope = Envelope::new(
        FrameId::new("panel"),
        "chrome-extension://panelbridge",
        FrameMessage::SidebarReady,
    );
    route.forward(envelope).await.unwrap();
    assert_eq!(tabs.sent(), vec!["PING", "DELIVER_FRAME"]);
}

#[tokio::test]
async fn test_broker_route_reports_failure() {
    let tabs = Arc::new(FakeTabs {
        active: None,
        ..FakeTabs::new(true)
    });
    let (handle, _task) = Arc::new(broker(tabs)).spawn();
    let err = BrokerRoute::new(handle)
        .forward(Envelope::new(
            FrameId::new("panel"),
            "chrome-extension://panelbridge",
            FrameMessage::SidebarReady,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, TransportError::Broker("No active tab found".into()));
}
