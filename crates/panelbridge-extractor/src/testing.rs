//! In-memory host document for unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use panelbridge_protocols::{DomNode, FrameAccess, HostDocument, HostError, ScriptHandle};
use parking_lot::Mutex;

pub(crate) const DOCS_URL: &str = "https://docs.google.com/document/d/abc123/edit";

#[derive(Default)]
pub(crate) struct FakeDoc {
    url: String,
    hook: Option<Result<String, HostError>>,
    nodes: HashMap<String, Vec<DomNode>>,
    body: String,
    text_nodes: Vec<String>,
    children: usize,
    selection: Option<String>,
    global: Option<String>,
    scripts: bool,
    calls: Mutex<Vec<String>>,
    removed: Mutex<Vec<u64>>,
}

impl FakeDoc {
    pub(crate) fn docs() -> Self {
        Self {
            url: DOCS_URL.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn with_text(mut self, selector: &str, texts: &[&str]) -> Self {
        self.nodes.insert(
            selector.to_string(),
            texts.iter().map(|t| DomNode::element(*t)).collect(),
        );
        self
    }

    pub(crate) fn with_frame(mut self, selector: &str, access: FrameAccess) -> Self {
        self.nodes
            .entry(selector.to_string())
            .or_default()
            .push(DomNode::Frame {
                src: "https://docs.google.com/frame".to_string(),
                access,
            });
        self
    }

    pub(crate) fn with_hook(mut self, hook: Result<String, HostError>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub(crate) fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self.children = 1;
        self
    }

    pub(crate) fn with_text_nodes(mut self, nodes: &[&str]) -> Self {
        self.text_nodes = nodes.iter().map(|s| s.to_string()).collect();
        self
    }

    pub(crate) fn with_selection(mut self, selection: &str) -> Self {
        self.selection = Some(selection.to_string());
        self
    }

    pub(crate) fn with_script_global(mut self, value: &str) -> Self {
        self.scripts = true;
        self.global = Some(value.to_string());
        self
    }

    pub(crate) fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub(crate) fn called(&self, call: &str) -> bool {
        self.calls.lock().iter().any(|c| c == call)
    }

    pub(crate) fn removed_scripts(&self) -> Vec<u64> {
        self.removed.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

impl HostDocument for FakeDoc {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn query_all(&self, selector: &str) -> Vec<DomNode> {
        self.record(format!("query:{selector}"));
        self.nodes.get(selector).cloned().unwrap_or_default()
    }

    fn body_text(&self) -> String {
        self.record("body_text");
        self.body.clone()
    }

    fn text_nodes(&self) -> Vec<String> {
        self.record("text_nodes");
        self.text_nodes.clone()
    }

    fn body_child_count(&self) -> usize {
        self.children
    }

    fn selection(&self) -> Option<String> {
        self.record("selection");
        self.selection.clone()
    }

    fn internal_hook(&self) -> Option<Result<String, HostError>> {
        self.record("hook");
        self.hook.clone()
    }

    fn inject_script(&self, _source: &str) -> Result<ScriptHandle, HostError> {
        self.record("inject");
        if self.scripts {
            Ok(ScriptHandle(7))
        } else {
            Err(HostError::ScriptUnsupported)
        }
    }

    fn remove_script(&self, handle: ScriptHandle) {
        self.removed.lock().push(handle.0);
    }

    fn read_global(&self, _name: &str) -> Option<String> {
        self.global.clone()
    }
}
