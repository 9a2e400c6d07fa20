//! # PanelBridge Extractor
//!
//! Runs in the host page's context and turns a third-party DOM into a
//! best-effort text string.
//!
//! ## Core Items
//!
//! - [`StrategyChain`] - ordered extraction strategies with per-strategy thresholds
//! - [`Extractor`] - runs the chain, tracks [`HealthState`], drives the monitor
//! - [`MonitorHandle`] - background diagnostics and re-attempts while extraction is failing
//! - [`HtmlSnapshot`] - a static HTML page as a [`HostDocument`](panelbridge_protocols::HostDocument)

mod chain;
mod extractor;
mod monitor;
mod probe;
mod snapshot;
mod strategy;

#[cfg(test)]
mod testing;

pub use chain::{ChainReport, Pass, StrategyChain};
pub use extractor::{Extractor, ExtractorBuilder, HealthState, UNTITLED_DOCUMENT};
pub use monitor::{DiagnosticSnapshot, HealthProbe, MonitorHandle, MonitorSettings, RateGate};
pub use snapshot::HtmlSnapshot;
pub use strategy::{Locator, StrategyDescriptor, ALTERNATE_SELECTORS, PRIMARY_SELECTOR};
