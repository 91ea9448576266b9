use bytes::Bytes;
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::error::EngineError;
use crate::message::WorkerMessage;

/// The network engine hosted inside a worker context.
///
/// Implementations own all protocol state. They are driven one command at a
/// time and report asynchronous happenings through [`EngineEvents`].
#[async_trait::async_trait]
pub trait Engine: Send + 'static {
    /// Connect to the mixnet. Completion of this call does not imply the
    /// connection is up; the engine posts `Connected` when it is.
    async fn start(&mut self, config: ClientConfig) -> Result<(), EngineError>;

    /// Release network resources. Must be a no-op when not started.
    async fn stop(&mut self) -> Result<(), EngineError>;

    /// Our own address, once connected.
    fn self_address(&self) -> Option<String>;

    /// Send already encoded bytes to `recipient`.
    async fn send(
        &mut self,
        message: Bytes,
        recipient: String,
        reply_surbs: Option<u32>,
    ) -> Result<(), EngineError>;
}

/// Outbound notification sink handed to an engine.
#[derive(Debug, Clone)]
pub struct EngineEvents {
    tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl EngineEvents {
    pub(crate) fn new(tx: mpsc::UnboundedSender<WorkerMessage>) -> Self {
        Self { tx }
    }

    /// Post a message to the caller side. Returns false once the caller has
    /// gone away.
    pub fn post(&self, message: WorkerMessage) -> bool {
        let name = message.name();
        if self.tx.send(message).is_err() {
            tracing::debug!(message = name, "caller side closed, dropping worker message");
            return false;
        }
        true
    }

    pub fn connected(&self, address: Option<String>) -> bool {
        self.post(WorkerMessage::Connected { address })
    }

    pub fn message_received(&self, payload: Bytes) -> bool {
        self.post(WorkerMessage::RawMessageReceived { payload })
    }

    pub fn error(&self, reason: impl Into<String>) -> bool {
        self.post(WorkerMessage::Error {
            reason: reason.into(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Check that `recipient` looks like `<identity>.<encryption>@<gateway>`.
pub fn validate_recipient(recipient: &str) -> Result<(), EngineError> {
    let invalid = || EngineError::InvalidRecipient(recipient.to_string());

    let (client, gateway) = recipient.split_once('@').ok_or_else(invalid)?;
    if gateway.is_empty() || gateway.contains('@') {
        return Err(invalid());
    }
    let (identity, encryption) = client.split_once('.').ok_or_else(invalid)?;
    if identity.is_empty() || encryption.is_empty() {
        return Err(invalid());
    }
    if recipient.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(())
}
