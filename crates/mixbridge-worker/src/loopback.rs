//! In-process engine that never touches the network.
//!
//! It hands out a synthetic address on `start` and delivers every message
//! sent to that address straight back as an inbound message. Messages for
//! any other recipient are accepted and dropped.

use bytes::Bytes;

use crate::config::ClientConfig;
use crate::engine::{validate_recipient, Engine, EngineEvents};
use crate::error::EngineError;

const DEFAULT_GATEWAY: &str = "loopback-gateway";

pub struct LoopbackEngine {
    events: EngineEvents,
    address: Option<String>,
    delivered: u64,
}

impl LoopbackEngine {
    pub fn new(events: EngineEvents) -> Self {
        Self {
            events,
            address: None,
            delivered: 0,
        }
    }

    /// Messages delivered back to ourselves since creation.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

#[async_trait::async_trait]
impl Engine for LoopbackEngine {
    async fn start(&mut self, config: ClientConfig) -> Result<(), EngineError> {
        if self.address.is_some() {
            return Err(EngineError::AlreadyStarted);
        }
        config.validate()?;

        let address = loopback_address(&config);
        tracing::info!(client_id = %config.client_id, %address, "loopback engine started");
        self.address = Some(address.clone());
        self.events.connected(Some(address));
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        match self.address.take() {
            Some(address) => tracing::info!(%address, "loopback engine stopped"),
            None => tracing::debug!("stop on idle loopback engine ignored"),
        }
        Ok(())
    }

    fn self_address(&self) -> Option<String> {
        self.address.clone()
    }

    async fn send(
        &mut self,
        message: Bytes,
        recipient: String,
        reply_surbs: Option<u32>,
    ) -> Result<(), EngineError> {
        let Some(address) = self.address.as_deref() else {
            return Err(EngineError::NotStarted);
        };
        validate_recipient(&recipient)?;

        if recipient == address {
            tracing::debug!(size = message.len(), ?reply_surbs, "looping message back");
            self.delivered += 1;
            self.events.message_received(message);
        } else {
            tracing::debug!(
                %recipient,
                size = message.len(),
                "no route in loopback mode, dropping"
            );
        }
        Ok(())
    }
}

fn loopback_address(config: &ClientConfig) -> String {
    let identity = sanitize(&config.client_id);
    let gateway = config
        .preferred_gateway_identity_key
        .as_deref()
        .map(sanitize)
        .unwrap_or_else(|| DEFAULT_GATEWAY.to_string());
    format!("{identity}.loopback@{gateway}")
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| if c.is_whitespace() || c == '@' || c == '.' { '-' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::message::WorkerMessage;

    fn engine() -> (LoopbackEngine, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (LoopbackEngine::new(EngineEvents::new(tx)), rx)
    }

    #[tokio::test]
    async fn start_posts_connected_with_address() {
        let (mut engine, mut rx) = engine();
        engine
            .start(ClientConfig::new("Example Client", "http://api"))
            .await
            .unwrap();

        let expected = "Example-Client.loopback@loopback-gateway".to_string();
        assert_eq!(engine.self_address(), Some(expected.clone()));
        assert_eq!(
            rx.recv().await,
            Some(WorkerMessage::Connected {
                address: Some(expected)
            })
        );
        assert!(validate_recipient(&engine.self_address().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let (mut engine, _rx) = engine();
        let config = ClientConfig::new("c1", "http://api");
        engine.start(config.clone()).await.unwrap();
        assert_eq!(engine.start(config).await, Err(EngineError::AlreadyStarted));
    }

    #[tokio::test]
    async fn stop_when_idle_is_noop() {
        let (mut engine, _rx) = engine();
        assert!(engine.stop().await.is_ok());
        assert!(engine.self_address().is_none());
    }

    #[tokio::test]
    async fn send_to_self_loops_back() {
        let (mut engine, mut rx) = engine();
        engine
            .start(ClientConfig::new("c1", "http://api").with_preferred_gateway("gw1"))
            .await
            .unwrap();
        let _connected = rx.recv().await;

        let me = engine.self_address().unwrap();
        assert_eq!(me, "c1.loopback@gw1");
        engine
            .send(Bytes::from_static(b"ping"), me, Some(5))
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await,
            Some(WorkerMessage::RawMessageReceived {
                payload: Bytes::from_static(b"ping")
            })
        );
        assert_eq!(engine.delivered(), 1);
    }

    #[tokio::test]
    async fn send_before_start_fails() {
        let (mut engine, _rx) = engine();
        let result = engine
            .send(Bytes::new(), "a.b@c".to_string(), None)
            .await;
        assert_eq!(result, Err(EngineError::NotStarted));
    }

    #[tokio::test]
    async fn send_to_malformed_recipient_fails() {
        let (mut engine, _rx) = engine();
        engine
            .start(ClientConfig::new("c1", "http://api"))
            .await
            .unwrap();
        let result = engine.send(Bytes::new(), "nobody".to_string(), None).await;
        assert!(matches!(result, Err(EngineError::InvalidRecipient(_))));
    }

    #[tokio::test]
    async fn send_to_other_recipient_is_dropped() {
        let (mut engine, mut rx) = engine();
        engine
            .start(ClientConfig::new("c1", "http://api"))
            .await
            .unwrap();
        let _connected = rx.recv().await;

        engine
            .send(Bytes::from_static(b"x"), "a.b@c".to_string(), None)
            .await
            .unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.delivered(), 0);
    }
}
