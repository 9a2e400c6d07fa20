//! # PanelBridge Broker
//!
//! The privileged context. Reaches the relay node in any tab (injecting it
//! when absent), and performs outbound HTTP the other contexts cannot.
//!
//! ## Core Items
//!
//! - [`Broker`] - message handler and tab relay
//! - [`InjectionRegistry`] - which tabs are known to host a relay node
//! - [`TabHost`] / [`LocalTabs`] - tab access, in-process implementation
//! - [`AiProxy`] - model-server health, catalog, and generation
//! - [`DocsApiClient`] - document REST fallback

mod broker;
mod docs_api;
mod error;
mod proxy;
mod registry;
mod tabs;

pub use broker::{Broker, BrokerHandle, BrokerRoute};
pub use docs_api::{extract_document_id, flatten_document, DocsApiClient, StaticToken, TokenSource};
pub use error::BrokerError;
pub use proxy::AiProxy;
pub use registry::InjectionRegistry;
pub use tabs::{LocalTabs, RelayInjector, TabHost};
