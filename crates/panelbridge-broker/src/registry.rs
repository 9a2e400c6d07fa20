//! Which tabs are known to host a relay node.

use dashmap::DashMap;
use panelbridge_protocols::TabId;

/// Tab → relay-present flag. Absence means unknown, so the broker pings.
#[derive(Debug, Default)]
pub struct InjectionRegistry {
    tabs: DashMap<TabId, bool>,
}

impl InjectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_injected(&self, tab: TabId) -> bool {
        self.tabs.get(&tab).is_some_and(|v| *v)
    }

    pub fn mark_injected(&self, tab: TabId) {
        self.tabs.insert(tab, true);
    }

    /// Forget a tab, e.g. after it navigated or closed.
    pub fn forget(&self, tab: TabId) {
        self.tabs.remove(&tab);
    }

    pub fn len(&self) -> usize {
        self.tabs.iter().filter(|e| *e.value()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
