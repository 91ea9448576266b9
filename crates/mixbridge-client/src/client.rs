use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::task::JoinHandle;

use mixbridge_codec::{Payload, PayloadCodec};
use mixbridge_events::SubscriptionRegistry;
use mixbridge_worker::{ClientConfig, WorkerHandle};

use crate::error::Result;
use crate::proxy::EngineProxy;

/// Outbound message that goes through the payload codec.
#[derive(Debug, Clone)]
pub struct SendRequest {
    pub payload: Payload,
    /// Mixnet address of the receiver.
    pub recipient: String,
    /// Reply SURBs to attach. `None` leaves it to the engine.
    pub reply_surbs: Option<u32>,
}

impl SendRequest {
    pub fn new(payload: Payload, recipient: impl Into<String>) -> Self {
        Self {
            payload,
            recipient: recipient.into(),
            reply_surbs: None,
        }
    }

    pub fn with_reply_surbs(mut self, reply_surbs: u32) -> Self {
        self.reply_surbs = Some(reply_surbs);
        self
    }
}

/// Outbound message sent as is.
#[derive(Debug, Clone)]
pub struct RawSendRequest {
    pub payload: Bytes,
    pub recipient: String,
    pub reply_surbs: Option<u32>,
}

impl RawSendRequest {
    pub fn new(payload: impl Into<Bytes>, recipient: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            recipient: recipient.into(),
            reply_surbs: None,
        }
    }

    pub fn with_reply_surbs(mut self, reply_surbs: u32) -> Self {
        self.reply_surbs = Some(reply_surbs);
        self
    }
}

/// Command façade over a background mixnet engine.
///
/// Created by [`create_client`](crate::create_client). Inbound traffic is
/// observed through [`events`](Self::events).
pub struct MixnetClient {
    proxy: Arc<dyn EngineProxy>,
    codec: PayloadCodec,
    events: SubscriptionRegistry,
    worker: Option<WorkerHandle>,
    router: Option<JoinHandle<()>>,
}

impl MixnetClient {
    /// Assemble a client from an arbitrary proxy. Nothing is routed into
    /// `events` unless the caller arranges it.
    pub fn from_proxy(
        proxy: Arc<dyn EngineProxy>,
        codec: PayloadCodec,
        events: SubscriptionRegistry,
    ) -> Self {
        Self {
            proxy,
            codec,
            events,
            worker: None,
            router: None,
        }
    }

    pub(crate) fn with_worker(mut self, worker: WorkerHandle, router: JoinHandle<()>) -> Self {
        self.worker = Some(worker);
        self.router = Some(router);
        self
    }

    /// Connect the engine to the mixnet. A `Connected` event follows once
    /// the connection is up.
    pub async fn start(&self, config: ClientConfig) -> Result<()> {
        tracing::info!(client_id = %config.client_id, "starting client");
        self.proxy.start(config).await
    }

    /// Disconnect from the mixnet. The client can be started again.
    pub async fn stop(&self) -> Result<()> {
        tracing::info!("stopping client");
        self.proxy.stop().await
    }

    /// Our mixnet address, or `None` before the engine has connected.
    pub async fn self_address(&self) -> Result<Option<String>> {
        self.proxy.self_address().await
    }

    /// Replace the MIME types treated as text, for sending and receiving.
    pub fn set_text_mime_types<I, S>(&self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codec.set_text_mime_types(types);
        tracing::debug!(types = ?self.codec.text_mime_types(), "text mime types updated");
    }

    pub fn get_text_mime_types(&self) -> Vec<String> {
        self.codec.text_mime_types()
    }

    /// Encode and send a payload.
    pub async fn send(&self, request: SendRequest) -> Result<()> {
        let message = self.codec.encode(&request.payload)?;
        tracing::debug!(
            recipient = %request.recipient,
            mime_type = request.payload.mime_type.as_deref().unwrap_or("none"),
            size = message.len(),
            "sending message"
        );
        self.proxy
            .send_bytes(message, request.recipient, request.reply_surbs)
            .await
    }

    /// Send bytes without any framing.
    pub async fn raw_send(&self, request: RawSendRequest) -> Result<()> {
        tracing::debug!(
            recipient = %request.recipient,
            size = request.payload.len(),
            "sending raw message"
        );
        self.proxy
            .send_bytes(request.payload, request.recipient, request.reply_surbs)
            .await
    }

    /// Subscription registry receiving this client's events.
    pub fn events(&self) -> &SubscriptionRegistry {
        &self.events
    }

    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    /// Shut down the background context and wait for it to exit.
    pub async fn close(mut self) -> Result<()> {
        if let Some(worker) = self.worker.take() {
            worker.shutdown().await?;
        }
        if let Some(router) = self.router.take() {
            if let Err(err) = router.await {
                tracing::warn!(error = %err, "event router task failed");
            }
        }
        tracing::debug!("client closed");
        Ok(())
    }
}

impl fmt::Debug for MixnetClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixnetClient")
            .field("codec", &self.codec)
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mixbridge_codec::{CodecError, TEXT_PLAIN};

    use super::*;
    use crate::error::ClientError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Start(String),
        Stop,
        SelfAddress,
        Send(Bytes, String, Option<u32>),
    }

    #[derive(Default)]
    struct RecordingProxy {
        calls: Mutex<Vec<Call>>,
    }

    #[async_trait::async_trait]
    impl EngineProxy for RecordingProxy {
        async fn start(&self, config: ClientConfig) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Start(config.client_id));
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Stop);
            Ok(())
        }

        async fn self_address(&self) -> Result<Option<String>> {
            self.calls.lock().unwrap().push(Call::SelfAddress);
            Ok(None)
        }

        async fn send_bytes(
            &self,
            message: Bytes,
            recipient: String,
            reply_surbs: Option<u32>,
        ) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Send(message, recipient, reply_surbs));
            Ok(())
        }
    }

    fn client() -> (MixnetClient, Arc<RecordingProxy>) {
        let proxy = Arc::new(RecordingProxy::default());
        let client = MixnetClient::from_proxy(
            proxy.clone(),
            PayloadCodec::new(),
            SubscriptionRegistry::new(),
        );
        (client, proxy)
    }

    #[tokio::test]
    async fn commands_forward_one_to_one() {
        let (client, proxy) = client();

        client.start(ClientConfig::new("c1", "http://api")).await.unwrap();
        assert_eq!(client.self_address().await.unwrap(), None);
        client.stop().await.unwrap();

        assert_eq!(
            *proxy.calls.lock().unwrap(),
            [Call::Start("c1".to_string()), Call::SelfAddress, Call::Stop]
        );
    }

    #[tokio::test]
    async fn send_encodes_and_raw_send_does_not() {
        let (client, proxy) = client();

        let payload = Payload::text("hi", TEXT_PLAIN);
        let expected = client.codec().encode(&payload).unwrap();
        client
            .send(SendRequest::new(payload, "a.b@c").with_reply_surbs(3))
            .await
            .unwrap();
        client
            .raw_send(RawSendRequest::new(Bytes::from_static(b"raw"), "a.b@c"))
            .await
            .unwrap();

        assert_eq!(
            *proxy.calls.lock().unwrap(),
            [
                Call::Send(expected, "a.b@c".to_string(), Some(3)),
                Call::Send(Bytes::from_static(b"raw"), "a.b@c".to_string(), None),
            ]
        );
    }

    #[tokio::test]
    async fn send_rejects_text_without_text_mime() {
        let (client, proxy) = client();

        let result = client
            .send(SendRequest::new(
                Payload::text("hi", "image/png"),
                "a.b@c",
            ))
            .await;
        assert!(matches!(
            result,
            Err(ClientError::Codec(CodecError::NotTextMime { .. }))
        ));
        assert!(proxy.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn text_mime_types_are_replaced() {
        let (client, _proxy) = client();
        assert_eq!(
            client.get_text_mime_types(),
            ["text/plain", "application/json"]
        );

        client.set_text_mime_types(["text/html"]);
        assert_eq!(client.get_text_mime_types(), ["text/html"]);
        assert!(!client.codec().is_text_mime("text/plain"));
    }

    #[tokio::test]
    async fn close_without_worker_is_ok() {
        let (client, _proxy) = client();
        client.close().await.unwrap();
    }
}
