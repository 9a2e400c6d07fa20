//! The ordered extraction strategy chain.
//!
//! Strategies run in fixed order and the chain stops at the first one whose
//! output meets its threshold. Errors raised by a strategy are logged and
//! treated as "no output"; they never abort the chain.

use std::time::Duration;

use panelbridge_config::ExtractorConfig;
use panelbridge_protocols::{DomNode, FrameAccess, HostDocument, HostError};
use thiserror::Error;
use tracing::{debug, trace};

use crate::probe;
use crate::strategy::{Locator, StrategyDescriptor, ALTERNATE_SELECTORS, PRIMARY_SELECTOR};

/// Which strategies a run may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Full,
    /// Selector-driven strategies only.
    StructuralOnly,
}

/// What a single chain run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainReport {
    pub text: Option<String>,
    /// Name of the strategy that produced `text`.
    pub winner: Option<String>,
    /// Names of every strategy invoked, in order.
    pub attempted: Vec<String>,
}

#[derive(Debug, Error)]
enum StrategyError {
    #[error("frame is cross-origin")]
    CrossOriginBlocked,

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Immutable, ordered list of strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyChain {
    strategies: Vec<StrategyDescriptor>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<StrategyDescriptor>) -> Self {
        Self { strategies }
    }

    /// Hook, paragraph renderer, alternate selectors, body text, text walk,
    /// script probe.
    pub fn standard(config: &ExtractorConfig) -> Self {
        let long = config.long_text_min_len;
        Self::new(vec![
            StrategyDescriptor::new("internal_hook", Locator::InternalHook, 1),
            StrategyDescriptor::selector("primary_selector", PRIMARY_SELECTOR, 1),
            StrategyDescriptor::selector_list("alternate_selectors", ALTERNATE_SELECTORS, 1)
                .recursing_frames(),
            StrategyDescriptor::new("body_text", Locator::BodyText, 1),
            StrategyDescriptor::new("text_walk", Locator::TextWalk, long),
            StrategyDescriptor::new(
                "script_probe",
                Locator::ScriptProbe {
                    global: config.probe_global.clone(),
                    delay: Duration::from_millis(config.probe_delay_ms),
                },
                long,
            ),
        ])
    }

    pub fn strategies(&self) -> &[StrategyDescriptor] {
        &self.strategies
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run the chain once against `doc`.
    pub async fn run(&self, doc: &dyn HostDocument, pass: Pass) -> ChainReport {
        let mut report = ChainReport::default();

        for strategy in &self.strategies {
            if pass == Pass::StructuralOnly && !strategy.locator.is_structural() {
                continue;
            }
            report.attempted.push(strategy.name.clone());

            match evaluate(strategy, doc).await {
                Ok(Some(text)) if strategy.accepts(&text) => {
                    debug!(
                        strategy = %strategy.name,
                        len = text.len(),
                        "Strategy produced content"
                    );
                    report.winner = Some(strategy.name.clone());
                    report.text = Some(text);
                    return report;
                }
                Ok(Some(text)) => {
                    trace!(
                        strategy = %strategy.name,
                        len = text.len(),
                        min_len = strategy.min_len,
                        "Strategy output below threshold"
                    );
                }
                Ok(None) => trace!(strategy = %strategy.name, "Strategy found nothing"),
                Err(e) => debug!(strategy = %strategy.name, error = %e, "Strategy failed"),
            }
        }

        report
    }
}

async fn evaluate(
    strategy: &StrategyDescriptor,
    doc: &dyn HostDocument,
) -> Result<Option<String>, StrategyError> {
    match &strategy.locator {
        Locator::InternalHook => match doc.internal_hook() {
            None => Ok(None),
            Some(result) => Ok(Some(result?)),
        },
        Locator::Selector { css } => Ok(selector_text(doc, css, strategy.recurse_frames)),
        Locator::SelectorList { css } => {
            for selector in css {
                if let Some(text) = selector_text(doc, selector, strategy.recurse_frames) {
                    if strategy.accepts(&text) {
                        debug!(selector = %selector, "Alternate selector matched");
                        return Ok(Some(text));
                    }
                }
            }
            Ok(None)
        }
        Locator::BodyText => {
            let text = doc.body_text();
            Ok((!text.trim().is_empty()).then_some(text))
        }
        Locator::TextWalk => {
            let nodes: Vec<String> = doc
                .text_nodes()
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .collect();
            Ok((!nodes.is_empty()).then(|| nodes.join("\n")))
        }
        Locator::ScriptProbe { global, delay } => Ok(probe::run(doc, global, *delay).await?),
    }
}

/// Text of every node matching `css`, joined with `\n`. `None` if nothing
/// non-empty matched.
fn selector_text(doc: &dyn HostDocument, css: &str, recurse_frames: bool) -> Option<String> {
    let mut parts = Vec::new();

    for node in doc.query_all(css) {
        match node {
            DomNode::Element { text } => {
                if !text.is_empty() {
                    parts.push(text);
                }
            }
            DomNode::Frame { src, access } => {
                if !recurse_frames {
                    continue;
                }
                match frame_text(&access) {
                    Ok(Some(text)) if !text.is_empty() => parts.push(text),
                    Ok(_) => trace!(src = %src, "Frame not ready or empty"),
                    Err(e) => debug!(src = %src, error = %e, "Skipping frame"),
                }
            }
        }
    }

    (!parts.is_empty()).then(|| parts.join("\n"))
}

fn frame_text(access: &FrameAccess) -> Result<Option<String>, StrategyError> {
    match access {
        FrameAccess::SameOrigin(inner) => Ok(Some(inner.body_text())),
        FrameAccess::NotReady => Ok(None),
        FrameAccess::CrossOrigin => Err(StrategyError::CrossOriginBlocked),
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
