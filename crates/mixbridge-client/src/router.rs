//! Turns worker messages into registry events.
//!
//! Every inbound message fires `RawMessageReceived` first. It is then decoded
//! and, if that succeeds, fires exactly one of `StringMessageReceived` or
//! `BinaryMessageReceived`. Messages that fail to decode stop after the raw
//! event.

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mixbridge_codec::PayloadCodec;
use mixbridge_events::{
    BinaryMessage, Connected, Event, Loaded, RawMessage, StringMessage, SubscriptionRegistry,
};
use mixbridge_worker::WorkerMessage;

#[derive(Debug, Clone)]
pub struct EventRouter {
    registry: SubscriptionRegistry,
    codec: PayloadCodec,
}

impl EventRouter {
    pub fn new(registry: SubscriptionRegistry, codec: PayloadCodec) -> Self {
        Self { registry, codec }
    }

    /// Dispatch one worker message. Returns the number of events fired.
    pub fn route(&self, message: WorkerMessage) -> usize {
        match message {
            WorkerMessage::Loaded => {
                tracing::debug!("engine announced Loaded again");
                self.fire(Event::Loaded(Loaded));
                1
            }
            WorkerMessage::Connected { address } => {
                tracing::info!(address = address.as_deref().unwrap_or("unknown"), "connected");
                self.fire(Event::Connected(Connected { address }));
                1
            }
            WorkerMessage::RawMessageReceived { payload } => self.route_raw(payload),
            WorkerMessage::Error { reason } => {
                tracing::error!(%reason, "engine reported an error");
                0
            }
        }
    }

    fn route_raw(&self, payload: Bytes) -> usize {
        self.fire(Event::RawMessageReceived(RawMessage {
            payload: payload.clone(),
        }));

        let decoded = match self.codec.decode(&payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(error = %err, size = payload.len(), "dropping undecodable message");
                return 1;
            }
        };

        let event = match decoded.text {
            Some(text) => Event::StringMessageReceived(StringMessage {
                mime_type: decoded.mime_type,
                payload: text,
                payload_raw: decoded.raw,
                headers: decoded.headers,
            }),
            None => Event::BinaryMessageReceived(BinaryMessage {
                mime_type: decoded.mime_type,
                payload: decoded.raw,
                headers: decoded.headers,
            }),
        };
        self.fire(event);
        2
    }

    fn fire(&self, event: Event) {
        let kind = event.kind();
        let report = self.registry.fire_event(&event);
        if report.failed > 0 {
            tracing::warn!(%kind, failed = report.failed, "event handlers panicked");
        }
    }
}

/// Drive `router` from `messages` on a background task until the worker
/// side closes the stream.
pub fn spawn_router(
    router: EventRouter,
    mut messages: mpsc::UnboundedReceiver<WorkerMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            router.route(message);
        }
        tracing::debug!("worker message stream closed");
    })
}
