//! Extension-bus inbox for a relay node.

use std::time::Duration;

use panelbridge_protocols::{BusResponse, Responder, TabMessage};
use tokio::sync::mpsc;

use crate::error::TransportError;

const BUS_CAPACITY: usize = 64;

/// A bus message and the responder its handler must consume.
pub type BusRequest = (TabMessage, Responder);

/// Sends [`TabMessage`]s to one relay node and waits for its reply.
#[derive(Debug, Clone)]
pub struct BusHandle {
    tx: mpsc::Sender<BusRequest>,
}

impl BusHandle {
    pub fn channel() -> (Self, mpsc::Receiver<BusRequest>) {
        let (tx, rx) = mpsc::channel(BUS_CAPACITY);
        (Self { tx }, rx)
    }

    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Deliver `message` and wait up to `timeout` for the reply.
    pub async fn request(
        &self,
        message: TabMessage,
        timeout: Duration,
    ) -> Result<BusResponse, TransportError> {
        let kind = message.type_name();
        let (responder, rx) = Responder::channel(kind);
        self.tx
            .send((message, responder))
            .await
            .map_err(|_| TransportError::NoTarget("receiving end does not exist".to_string()))?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(TransportError::NoTarget(format!("{kind} handler went away"))),
            Err(_) => Err(TransportError::NoTarget(format!(
                "no reply to {kind} within {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_reply() {
        let (bus, mut rx) = BusHandle::channel();
        tokio::spawn(async move {
            if let Some((TabMessage::Ping, responder)) = rx.recv().await {
                responder.respond(BusResponse::ok());
            }
        });
        let resp = bus.request(TabMessage::Ping, Duration::from_secs(1)).await.unwrap();
        assert!(resp.success);
    }

    #[tokio::test]
    async fn test_closed_bus() {
        let (bus, rx) = BusHandle::channel();
        drop(rx);
        assert!(!bus.is_alive());
        assert!(bus.request(TabMessage::Ping, Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_handler_times_out() {
        let (bus, mut rx) = BusHandle::channel();
        let _hold = tokio::spawn(async move {
            let held = rx.recv().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(held);
        });
        let err = bus
            .request(TabMessage::Ping, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("within 100ms"));
    }
}
