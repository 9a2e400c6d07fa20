//! A saved HTML page as a [`HostDocument`].
//!
//! The page is re-parsed on every read, so the snapshot stays `Send + Sync`
//! and never holds a parsed tree between calls.

use std::collections::HashMap;
use std::sync::Arc;

use panelbridge_protocols::{DomNode, FrameAccess, HostDocument};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

const NON_RENDERED: [&str; 4] = ["script", "style", "noscript", "template"];

pub struct HtmlSnapshot {
    url: String,
    html: String,
    selection: Option<String>,
    hook_text: Option<String>,
    frames: HashMap<String, Arc<dyn HostDocument>>,
}

impl HtmlSnapshot {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            selection: None,
            hook_text: None,
            frames: HashMap::new(),
        }
    }

    /// Pretend the user has `text` selected.
    pub fn with_selection(mut self, text: impl Into<String>) -> Self {
        self.selection = Some(text.into());
        self
    }

    /// Expose `text` through the page's internal accessor.
    pub fn with_internal_text(mut self, text: impl Into<String>) -> Self {
        self.hook_text = Some(text.into());
        self
    }

    /// Attach a loaded document for `<iframe src="{src}">`.
    pub fn with_frame(mut self, src: impl Into<String>, document: Arc<dyn HostDocument>) -> Self {
        self.frames.insert(src.into(), document);
        self
    }

    fn parse(&self) -> Html {
        Html::parse_document(&self.html)
    }

    fn frame_access(&self, src: &str) -> FrameAccess {
        if let Some(doc) = self.frames.get(src) {
            return FrameAccess::SameOrigin(Arc::clone(doc));
        }
        if src.is_empty() || src == "about:blank" {
            return FrameAccess::NotReady;
        }
        let Ok(base) = Url::parse(&self.url) else {
            return FrameAccess::CrossOrigin;
        };
        match base.join(src) {
            Ok(target) if target.origin() == base.origin() => FrameAccess::NotReady,
            _ => FrameAccess::CrossOrigin,
        }
    }

    fn node_for(&self, el: ElementRef<'_>) -> DomNode {
        let value = el.value();
        match value.name() {
            "iframe" => {
                let src = value.attr("src").unwrap_or_default().to_string();
                let access = self.frame_access(&src);
                DomNode::Frame { src, access }
            }
            "input" => DomNode::element(value.attr("value").unwrap_or_default()),
            _ => DomNode::element(el.text().collect::<String>()),
        }
    }
}

fn body(html: &Html) -> Option<ElementRef<'_>> {
    let sel = Selector::parse("body").ok()?;
    html.select(&sel).next()
}

/// Text nodes under `body`, skipping script-like elements.
fn rendered_text_nodes(body: ElementRef<'_>) -> Vec<String> {
    body.descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            let hidden = parent
                .value()
                .as_element()
                .is_some_and(|e| NON_RENDERED.contains(&e.name()));
            (!hidden).then(|| String::from(&**text))
        })
        .collect()
}

impl HostDocument for HtmlSnapshot {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn query_all(&self, selector: &str) -> Vec<DomNode> {
        let sel = match Selector::parse(selector) {
            Ok(sel) => sel,
            Err(e) => {
                debug!(selector, error = %e, "Invalid selector");
                return Vec::new();
            }
        };
        let html = self.parse();
        html.select(&sel).map(|el| self.node_for(el)).collect()
    }

    fn body_text(&self) -> String {
        let html = self.parse();
        let Some(body) = body(&html) else {
            return String::new();
        };
        rendered_text_nodes(body)
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn text_nodes(&self) -> Vec<String> {
        let html = self.parse();
        body(&html).map(rendered_text_nodes).unwrap_or_default()
    }

    fn body_child_count(&self) -> usize {
        let html = self.parse();
        body(&html)
            .map(|b| b.children().filter(|c| c.value().is_element()).count())
            .unwrap_or(0)
    }

    fn selection(&self) -> Option<String> {
        self.selection.clone()
    }

    fn internal_hook(&self) -> Option<Result<String, panelbridge_protocols::HostError>> {
        self.hook_text.clone().map(Ok)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
