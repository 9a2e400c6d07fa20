//! Tab access for the broker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use panelbridge_protocols::{BusResponse, TabId, TabMessage};
use panelbridge_relay::{BusHandle, TransportError};
use parking_lot::RwLock;
use tracing::debug;

const NO_RECEIVER: &str = "Could not establish connection. Receiving end does not exist.";

/// What the broker needs from the browser's tab facilities.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// The focused tab, if any.
    async fn active_tab(&self) -> Option<TabId>;

    async fn tab_url(&self, tab: TabId) -> Option<String>;

    /// Deliver `message` to the relay node in `tab`. Fails when nothing in
    /// the tab is listening or no reply arrives within `timeout`.
    async fn send(
        &self,
        tab: TabId,
        message: TabMessage,
        timeout: Duration,
    ) -> Result<BusResponse, TransportError>;

    /// Load the relay node into `tab`.
    async fn inject(&self, tab: TabId) -> Result<(), String>;
}

/// Starts a relay node for a tab and returns its bus inbox.
#[async_trait]
pub trait RelayInjector: Send + Sync {
    async fn inject(&self, tab: TabId, url: &str) -> Result<BusHandle, String>;
}

struct LocalTab {
    url: String,
    bus: Option<BusHandle>,
}

/// In-process [`TabHost`].
#[derive(Default)]
pub struct LocalTabs {
    tabs: DashMap<TabId, LocalTab>,
    active: RwLock<Option<TabId>>,
    injector: Option<Arc<dyn RelayInjector>>,
}

impl LocalTabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_injector(injector: Arc<dyn RelayInjector>) -> Self {
        Self {
            injector: Some(injector),
            ..Self::default()
        }
    }

    /// Open a tab with no relay node and make it active.
    pub fn open(&self, tab: TabId, url: impl Into<String>) {
        self.tabs.insert(
            tab,
            LocalTab {
                url: url.into(),
                bus: None,
            },
        );
        self.activate(tab);
    }

    pub fn activate(&self, tab: TabId) {
        *self.active.write() = Some(tab);
    }

    /// Connect an already-running relay node to `tab`.
    pub fn attach(&self, tab: TabId, bus: BusHandle) {
        if let Some(mut entry) = self.tabs.get_mut(&tab) {
            entry.bus = Some(bus);
        }
    }

    /// Drop the tab's relay node, as a page reload would.
    pub fn detach(&self, tab: TabId) {
        if let Some(mut entry) = self.tabs.get_mut(&tab) {
            entry.bus = None;
        }
    }

    pub fn close(&self, tab: TabId) {
        self.tabs.remove(&tab);
        let mut active = self.active.write();
        if *active == Some(tab) {
            *active = None;
        }
    }

    fn bus(&self, tab: TabId) -> Option<BusHandle> {
        self.tabs
            .get(&tab)
            .and_then(|t| t.bus.clone())
            .filter(BusHandle::is_alive)
    }
}

#[async_trait]
impl TabHost for LocalTabs {
    async fn active_tab(&self) -> Option<TabId> {
        *self.active.read()
    }

    async fn tab_url(&self, tab: TabId) -> Option<String> {
        self.tabs.get(&tab).map(|t| t.url.clone())
    }

    async fn send(
        &self,
        tab: TabId,
        message: TabMessage,
        timeout: Duration,
    ) -> Result<BusResponse, TransportError> {
        let bus = self
            .bus(tab)
            .ok_or_else(|| TransportError::NoTarget(NO_RECEIVER.to_string()))?;
        bus.request(message, timeout).await
    }

    async fn inject(&self, tab: TabId) -> Result<(), String> {
        let injector = self
            .injector
            .clone()
            .ok_or_else(|| "scripting is not available".to_string())?;
        let url = self
            .tab_url(tab)
            .await
            .ok_or_else(|| format!("no such tab {tab}"))?;
        let bus = injector.inject(tab, &url).await?;
        debug!(%tab, "Relay node attached");
        self.attach(tab, bus);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_relay_fails() {
        let tabs = LocalTabs::new();
        tabs.open(TabId(1), "https://docs.google.com/document/d/x/edit");
        assert_eq!(tabs.active_tab().await, Some(TabId(1)));
        let err = tabs
            .send(TabId(1), TabMessage::Ping, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Receiving end does not exist"));
    }

    #[tokio::test]
    async fn test_inject_without_injector() {
        let tabs = LocalTabs::new();
        tabs.open(TabId(1), "https://docs.google.com/document/d/x/edit");
        assert!(tabs.inject(TabId(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_close_clears_active() {
        let tabs = LocalTabs::new();
        tabs.open(TabId(4), "about:blank");
        tabs.close(TabId(4));
        assert_eq!(tabs.active_tab().await, None);
        assert_eq!(tabs.tab_url(TabId(4)).await, None);
    }
}
