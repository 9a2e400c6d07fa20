//! Ordered delivery fallbacks for frame messages.

use std::sync::Arc;

use async_trait::async_trait;
use panelbridge_protocols::{Envelope, FrameId, FrameMessage};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::TransportError;
use crate::frame::{FrameHandle, FrameResolver};

/// Anything that can carry a [`FrameMessage`] away from this frame.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn transmit(&self, message: FrameMessage) -> Result<(), TransportError>;
}

/// Last-resort path through the privileged broker.
#[async_trait]
pub trait BrokerLink: Send + Sync {
    async fn forward(&self, envelope: Envelope) -> Result<(), TransportError>;
}

/// Which step of the chain delivered a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStep {
    Cached,
    Primary,
    Fallback(String),
    Broadcast,
    Broker,
}

/// Tries each delivery path in order until one accepts the message.
///
/// 1. the cached target frame
/// 2. the primary selector
/// 3. each fallback selector
/// 4. parent and top windows
/// 5. the broker
///
/// A frame found by a selector replaces the cached one.
pub struct TransportChain {
    source: FrameId,
    origin: String,
    cached: Mutex<Option<FrameHandle>>,
    resolver: Option<Arc<dyn FrameResolver>>,
    primary: Option<String>,
    fallbacks: Vec<String>,
    broker: Option<Arc<dyn BrokerLink>>,
}

impl TransportChain {
    pub fn builder(source: FrameId, origin: impl Into<String>) -> TransportChainBuilder {
        TransportChainBuilder::new(source, origin)
    }

    pub fn source(&self) -> &FrameId {
        &self.source
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn cached_target(&self) -> Option<FrameHandle> {
        self.cached.lock().clone()
    }

    pub fn set_cached_target(&self, handle: Option<FrameHandle>) {
        *self.cached.lock() = handle;
    }

    fn envelope(&self, message: FrameMessage) -> Envelope {
        Envelope::new(self.source.clone(), self.origin.clone(), message)
    }

    fn via_selector(&self, selector: &str, envelope: &Envelope) -> bool {
        let Some(resolver) = &self.resolver else {
            return false;
        };
        let Some(handle) = resolver.resolve(selector) else {
            trace!(selector, "No frame for selector");
            return false;
        };
        match handle.post(envelope.clone()) {
            Ok(()) => {
                self.set_cached_target(Some(handle));
                true
            }
            Err(e) => {
                trace!(selector, error = %e, "Selector target rejected message");
                false
            }
        }
    }

    fn broadcast(&self, envelope: &Envelope) -> bool {
        let Some(resolver) = &self.resolver else {
            return false;
        };
        let parent = resolver.parent();
        let top = resolver.top();
        let mut delivered = false;
        if let Some(parent) = &parent {
            delivered |= parent.post(envelope.clone()).is_ok();
        }
        if let Some(top) = top {
            let same = parent.as_ref().is_some_and(|p| p.id() == top.id());
            if !same {
                delivered |= top.post(envelope.clone()).is_ok();
            }
        }
        delivered
    }

    /// Deliver `message`, returning the step that accepted it.
    pub async fn send(&self, message: FrameMessage) -> Result<RouteStep, TransportError> {
        let kind = message.type_name();
        let envelope = self.envelope(message);

        let cached = self.cached_target();
        if let Some(handle) = cached {
            match handle.post(envelope.clone()) {
                Ok(()) => return Ok(RouteStep::Cached),
                Err(e) => {
                    debug!(kind, error = %e, "Cached target gone, falling back");
                    self.set_cached_target(None);
                }
            }
        }

        if let Some(primary) = &self.primary {
            if self.via_selector(primary, &envelope) {
                return Ok(RouteStep::Primary);
            }
        }

        for selector in &self.fallbacks {
            if self.via_selector(selector, &envelope) {
                debug!(kind, selector = %selector, "Delivered via fallback selector");
                return Ok(RouteStep::Fallback(selector.clone()));
            }
        }

        if self.broadcast(&envelope) {
            debug!(kind, "Delivered via parent/top broadcast");
            return Ok(RouteStep::Broadcast);
        }

        if let Some(broker) = &self.broker {
            match broker.forward(envelope).await {
                Ok(()) => {
                    debug!(kind, "Delivered via broker");
                    return Ok(RouteStep::Broker);
                }
                Err(e) => warn!(kind, error = %e, "Broker relay failed"),
            }
        }

        warn!(kind, "Every transport step failed");
        Err(TransportError::Exhausted)
    }
}

#[async_trait]
impl MessageSink for TransportChain {
    async fn transmit(&self, message: FrameMessage) -> Result<(), TransportError> {
        self.send(message).await.map(|_| ())
    }
}

/// Builder for [`TransportChain`].
pub struct TransportChainBuilder {
    source: FrameId,
    origin: String,
    cached: Option<FrameHandle>,
    resolver: Option<Arc<dyn FrameResolver>>,
    primary: Option<String>,
    fallbacks: Vec<String>,
    broker: Option<Arc<dyn BrokerLink>>,
}

impl TransportChainBuilder {
    pub fn new(source: FrameId, origin: impl Into<String>) -> Self {
        Self {
            source,
            origin: origin.into(),
            cached: None,
            resolver: None,
            primary: None,
            fallbacks: Vec::new(),
            broker: None,
        }
    }

    pub fn target(mut self, handle: FrameHandle) -> Self {
        self.cached = Some(handle);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn FrameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn primary(mut self, selector: impl Into<String>) -> Self {
        self.primary = Some(selector.into());
        self
    }

    pub fn fallbacks<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallbacks = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn broker(mut self, link: Arc<dyn BrokerLink>) -> Self {
        self.broker = Some(link);
        self
    }

    pub fn build(self) -> TransportChain {
        TransportChain {
            source: self.source,
            origin: self.origin,
            cached: Mutex::new(self.cached),
            resolver: self.resolver,
            primary: self.primary,
            fallbacks: self.fallbacks,
            broker: self.broker,
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
