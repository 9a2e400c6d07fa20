//! # PanelBridge Relay
//!
//! Best-effort RPC over fire-and-forget messaging.
//!
//! ## Core Items
//!
//! - [`Correlator`] - pairs each outbound request with exactly one response or a timeout
//! - [`TransportChain`] - ordered delivery fallbacks (cached frame, selectors, parent/top, broker)
//! - [`RelayNode`] - host-side dispatcher in front of the extractor
//! - [`FrameHandle`] / [`BusHandle`] - addressable inboxes for frame and bus messages

mod bus;
mod correlator;
mod error;
mod frame;
mod node;
mod transport;

pub use bus::{BusHandle, BusRequest};
pub use correlator::Correlator;
pub use error::{RequestError, TransportError};
pub use frame::{FrameHandle, FrameResolver, FrameTable};
pub use node::{OriginPolicy, RelayEndpoint, RelayNode, RelayStatus};
pub use transport::{BrokerLink, MessageSink, RouteStep, TransportChain, TransportChainBuilder};
