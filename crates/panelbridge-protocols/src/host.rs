//! Read access to the host page.
//!
//! The host document is third-party, changes without notice and has no
//! public read API. Everything here is best effort: reads return what is
//! there right now and never block.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while reading the host page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("Frame is cross-origin")]
    CrossOriginBlocked,

    #[error("Script injection is not supported by this document")]
    ScriptUnsupported,

    #[error("Internal accessor failed: {0}")]
    Accessor(String),
}

/// Handle to a script element injected into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHandle(pub u64);

/// How a nested frame's document can be reached.
#[derive(Clone)]
pub enum FrameAccess {
    /// Same origin and loaded.
    SameOrigin(Arc<dyn HostDocument>),
    /// Same origin but the document has not loaded yet.
    NotReady,
    /// Reading it would throw a security error.
    CrossOrigin,
}

impl fmt::Debug for FrameAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameOrigin(doc) => f.debug_tuple("SameOrigin").field(&doc.url()).finish(),
            Self::NotReady => f.write_str("NotReady"),
            Self::CrossOrigin => f.write_str("CrossOrigin"),
        }
    }
}

/// A node matched by a selector.
#[derive(Debug, Clone)]
pub enum DomNode {
    /// Any non-frame element. `text` is its rendered text (or `value` for
    /// form inputs).
    Element { text: String },
    /// An `<iframe>`.
    Frame { src: String, access: FrameAccess },
}

impl DomNode {
    pub fn element(text: impl Into<String>) -> Self {
        Self::Element { text: text.into() }
    }

    /// Text of an element; `None` for frames.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Element { text } => Some(text),
            Self::Frame { .. } => None,
        }
    }
}

/// A live (or snapshotted) host document.
pub trait HostDocument: Send + Sync {
    fn url(&self) -> String;

    /// All nodes matching a CSS selector, in document order. Invalid
    /// selectors match nothing.
    fn query_all(&self, selector: &str) -> Vec<DomNode>;

    /// Rendered text of `<body>`.
    fn body_text(&self) -> String;

    /// Every text node under `<body>`, in document order.
    fn text_nodes(&self) -> Vec<String>;

    fn body_child_count(&self) -> usize;

    /// Current user selection, if any.
    fn selection(&self) -> Option<String>;

    /// The page's private text accessor. `None` when the page does not
    /// expose one.
    fn internal_hook(&self) -> Option<Result<String, HostError>> {
        None
    }

    /// Inject a script element with the given source.
    fn inject_script(&self, source: &str) -> Result<ScriptHandle, HostError> {
        let _ = source;
        Err(HostError::ScriptUnsupported)
    }

    fn remove_script(&self, handle: ScriptHandle) {
        let _ = handle;
    }

    /// Read a string global written by an injected script.
    fn read_global(&self, name: &str) -> Option<String> {
        let _ = name;
        None
    }
}
