use std::sync::Arc;
use std::time::Duration;

use mixbridge_codec::{PayloadCodec, TextMimeTypes};
use mixbridge_events::{Event, Loaded, SubscriptionRegistry};
use mixbridge_worker::{
    bootstrap, BootstrapConfig, Engine, EngineError, EngineEvents, LoopbackEngine,
};

use crate::client::MixnetClient;
use crate::error::{ClientError, Result};
use crate::proxy::ChannelProxy;
use crate::router::{spawn_router, EventRouter};

/// Settings for [`create_client`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// MIME types treated as text. `None` keeps `text/plain` and
    /// `application/json`.
    pub text_mime_types: Option<Vec<String>>,
    pub bootstrap: BootstrapConfig,
}

impl ClientOptions {
    pub fn with_text_mime_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_mime_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap.ready_timeout = Some(timeout);
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: BootstrapConfig) -> Self {
        self.bootstrap = bootstrap;
        self
    }
}

/// Builder for a [`MixnetClient`].
#[derive(Debug, Default)]
pub struct ClientBuilder {
    options: ClientOptions,
    registry: Option<SubscriptionRegistry>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Route events into an existing registry. Handlers added to it before
    /// [`build`](Self::build) also observe the initial `Loaded` event.
    pub fn registry(mut self, registry: SubscriptionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Boot the engine built by `factory` and wire a client to it.
    pub async fn build<E, F>(self, factory: F) -> Result<MixnetClient>
    where
        E: Engine,
        F: FnOnce(EngineEvents) -> std::result::Result<E, EngineError> + Send + 'static,
    {
        let mut worker = bootstrap(factory, &self.options.bootstrap).await?;
        let messages = worker.take_messages().ok_or(ClientError::Disconnected)?;

        let codec = match self.options.text_mime_types {
            Some(types) => PayloadCodec::with_text_mime_types(TextMimeTypes::new(types)),
            None => PayloadCodec::new(),
        };
        let registry = self.registry.unwrap_or_default();
        let proxy = ChannelProxy::new(worker.commands());

        // Fire before the router starts so Loaded precedes anything it routes.
        registry.fire_event(&Event::Loaded(Loaded));

        let router = spawn_router(EventRouter::new(registry.clone(), codec.clone()), messages);
        tracing::debug!(text_mime_types = ?codec.text_mime_types(), "client created");

        Ok(MixnetClient::from_proxy(Arc::new(proxy), codec, registry).with_worker(worker, router))
    }
}

/// Boot a background engine and return a client wired to it.
///
/// Fails if the engine does not report `Loaded` as its first message.
pub async fn create_client<E, F>(factory: F, options: ClientOptions) -> Result<MixnetClient>
where
    E: Engine,
    F: FnOnce(EngineEvents) -> std::result::Result<E, EngineError> + Send + 'static,
{
    ClientBuilder::new().options(options).build(factory).await
}

/// [`create_client`] over the in-process [`LoopbackEngine`].
pub async fn create_loopback_client(options: ClientOptions) -> Result<MixnetClient> {
    create_client(|events| Ok(LoopbackEngine::new(events)), options).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use mixbridge_codec::{Payload, APPLICATION_JSON};
    use mixbridge_events::EventKind;
    use mixbridge_worker::{BootstrapError, ClientConfig};
    use tokio::sync::mpsc;

    use super::*;
    use crate::client::{RawSendRequest, SendRequest};

    const WAIT: Duration = Duration::from_secs(5);

    async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
        tokio::time::timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream closed")
    }

    #[tokio::test]
    async fn startup_error_rejects_creation() {
        let result = create_client(
            |_events| -> std::result::Result<LoopbackEngine, EngineError> {
                Err(EngineError::Failed("engine unavailable".to_string()))
            },
            ClientOptions::default(),
        )
        .await;

        match result {
            Err(ClientError::Bootstrap(BootstrapError::Engine(reason))) => {
                assert_eq!(reason, "engine unavailable");
            }
            other => panic!("expected bootstrap error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn provided_registry_sees_loaded() {
        let registry = SubscriptionRegistry::new();
        let loaded = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&loaded);
        registry.on_loaded(move |_| *counter.lock().unwrap() += 1);

        let client = ClientBuilder::new()
            .registry(registry.clone())
            .build(|events| Ok(LoopbackEngine::new(events)))
            .await
            .unwrap();

        assert_eq!(*loaded.lock().unwrap(), 1);
        assert_eq!(client.events().subscription_count(EventKind::Loaded), 1);
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn loopback_round_trip() {
        let client = create_loopback_client(ClientOptions::default()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = client.events();
        for kind in [
            EventKind::Connected,
            EventKind::RawMessageReceived,
            EventKind::StringMessageReceived,
            EventKind::BinaryMessageReceived,
        ] {
            let tx = tx.clone();
            events.add_subscription(kind, move |event: &Event| {
                let _ = tx.send(event.clone());
            });
        }

        assert_eq!(client.self_address().await.unwrap(), None);
        client
            .start(ClientConfig::new("alice", "http://localhost:8080"))
            .await
            .unwrap();

        let Event::Connected(connected) = next(&mut rx).await else {
            panic!("expected Connected first");
        };
        let address = client.self_address().await.unwrap();
        assert_eq!(connected.address, address);
        let address = address.unwrap();

        client
            .send(SendRequest::new(
                Payload::text("{\"n\":1}", APPLICATION_JSON),
                address.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(next(&mut rx).await.kind(), EventKind::RawMessageReceived);
        match next(&mut rx).await {
            Event::StringMessageReceived(message) => {
                assert_eq!(message.mime_type, APPLICATION_JSON);
                assert_eq!(message.payload, "{\"n\":1}");
            }
            other => panic!("expected string message, got {other:?}"),
        }

        // Unframed bytes still surface as raw, then nothing else.
        client
            .raw_send(RawSendRequest::new(Bytes::from_static(b"junk"), address.clone()))
            .await
            .unwrap();
        assert_eq!(
            next(&mut rx).await,
            Event::RawMessageReceived(mixbridge_events::RawMessage {
                payload: Bytes::from_static(b"junk")
            })
        );

        client
            .send(SendRequest::new(
                Payload::binary(vec![9u8, 9], "application/x-test"),
                address,
            ))
            .await
            .unwrap();
        assert_eq!(next(&mut rx).await.kind(), EventKind::RawMessageReceived);
        assert_eq!(next(&mut rx).await.kind(), EventKind::BinaryMessageReceived);

        client.stop().await.unwrap();
        assert_eq!(client.self_address().await.unwrap(), None);
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn custom_text_mime_types_apply_to_routing() {
        let client = create_loopback_client(
            ClientOptions::default().with_text_mime_types([APPLICATION_JSON]),
        )
        .await
        .unwrap();
        assert_eq!(client.get_text_mime_types(), [APPLICATION_JSON]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        client.events().on_binary_message(move |message| {
            let _ = tx.send(message.mime_type.clone());
        });

        client
            .start(ClientConfig::new("bob", "http://localhost:8080"))
            .await
            .unwrap();
        let address = client.self_address().await.unwrap().unwrap();

        // text/plain is no longer text: it must go out as binary too.
        client
            .send(SendRequest::new(
                Payload::binary(Bytes::from_static(b"hello"), "text/plain"),
                address,
            ))
            .await
            .unwrap();
        assert_eq!(next(&mut rx).await, "text/plain");

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn client_restarts_after_stop() {
        let client = create_loopback_client(ClientOptions::default()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        client.events().on_connected(move |connected| {
            let _ = tx.send(connected.address.clone());
        });

        // Stopping an idle client is a no-op.
        client.stop().await.unwrap();
        assert_eq!(client.self_address().await.unwrap(), None);

        let config = ClientConfig::new("carol", "http://localhost:8080");
        client.start(config.clone()).await.unwrap();
        let first = next(&mut rx).await;
        assert!(first.is_some());

        client.stop().await.unwrap();
        assert_eq!(client.self_address().await.unwrap(), None);

        client.start(config).await.unwrap();
        let second = next(&mut rx).await;
        assert_eq!(second, first);
        assert_eq!(client.self_address().await.unwrap(), second);

        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn text_mime_types_changed_at_runtime_apply_to_routing() {
        let client = create_loopback_client(ClientOptions::default()).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        for kind in [
            EventKind::StringMessageReceived,
            EventKind::BinaryMessageReceived,
        ] {
            let tx = tx.clone();
            client.events().add_subscription(kind, move |event: &Event| {
                let _ = tx.send(event.clone());
            });
        }

        client
            .start(ClientConfig::new("dave", "http://localhost:8080"))
            .await
            .unwrap();
        let address = client.self_address().await.unwrap().unwrap();

        client.set_text_mime_types([APPLICATION_JSON]);
        assert_eq!(client.get_text_mime_types(), [APPLICATION_JSON]);

        client
            .send(SendRequest::new(
                Payload::binary(Bytes::from_static(b"plain"), "text/plain"),
                address,
            ))
            .await
            .unwrap();
        match next(&mut rx).await {
            Event::BinaryMessageReceived(message) => {
                assert_eq!(message.mime_type, "text/plain");
                assert_eq!(message.payload, Bytes::from_static(b"plain"));
            }
            other => panic!("expected binary message, got {other:?}"),
        }

        client.close().await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
