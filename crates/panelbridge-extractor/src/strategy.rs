//! Strategy descriptors.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Paragraph renderer used by the document editor.
pub const PRIMARY_SELECTOR: &str = ".kix-paragraphrenderer";

/// Structural selectors tried when the paragraph renderer yields nothing.
pub const ALTERNATE_SELECTORS: [&str; 12] = [
    ".kix-page-content-wrapper",
    ".docs-texteventtarget-iframe",
    ".docs-editor-container",
    ".kix-appview-editor",
    ".kix-canvas-tile-content",
    ".goog-inline-block.kix-lineview-text-block",
    ".kix-lineview",
    ".kix-lineview-content",
    "[contenteditable='true']",
    ".docs-text-ui-cursor-blink",
    "iframe.docs-texteventtarget-iframe",
    ".docs-text-ui-editor-window",
];

/// Where a strategy looks for text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// The page's private accessor.
    InternalHook,
    /// Every match joined with `\n`.
    Selector { css: String },
    /// First selector whose matches meet the threshold.
    SelectorList { css: Vec<String> },
    /// Rendered text of `<body>`.
    BodyText,
    /// Non-blank text nodes joined with `\n`.
    TextWalk,
    /// Inject a script that copies page text into `global`, wait `delay`,
    /// read it back.
    ScriptProbe { global: String, delay: Duration },
}

impl Locator {
    /// Selector-driven locators are the only ones re-run by selector retries.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Selector { .. } | Self::SelectorList { .. })
    }
}

/// One step in a [`StrategyChain`](crate::StrategyChain).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyDescriptor {
    pub name: String,
    pub locator: Locator,
    /// Output shorter than this (in trimmed characters) does not count.
    pub min_len: usize,
    /// Read same-origin frames matched by this strategy's selectors.
    pub recurse_frames: bool,
}

impl StrategyDescriptor {
    pub fn new(name: impl Into<String>, locator: Locator, min_len: usize) -> Self {
        Self {
            name: name.into(),
            locator,
            min_len,
            recurse_frames: false,
        }
    }

    pub fn recursing_frames(mut self) -> Self {
        self.recurse_frames = true;
        self
    }

    pub fn selector(name: impl Into<String>, css: impl Into<String>, min_len: usize) -> Self {
        Self::new(name, Locator::Selector { css: css.into() }, min_len)
    }

    pub fn selector_list<I, S>(name: impl Into<String>, css: I, min_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            Locator::SelectorList {
                css: css.into_iter().map(Into::into).collect(),
            },
            min_len,
        )
    }

    /// Whether `text` meets this strategy's threshold.
    pub fn accepts(&self, text: &str) -> bool {
        let len = text.trim().chars().count();
        len > 0 && len >= self.min_len
    }
}
