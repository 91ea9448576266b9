use bytes::Bytes;
use tokio::sync::mpsc;

use mixbridge_worker::{ClientConfig, CommandResponse, WorkerCommand, WorkerRequest};

use crate::error::{ClientError, Result};

/// Remote-call surface of a background engine.
///
/// One method per engine command. Every call resolves with the engine's
/// answer or fails; none of them hang once the engine is gone.
#[async_trait::async_trait]
pub trait EngineProxy: Send + Sync {
    async fn start(&self, config: ClientConfig) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn self_address(&self) -> Result<Option<String>>;

    /// Send already encoded bytes.
    async fn send_bytes(
        &self,
        message: Bytes,
        recipient: String,
        reply_surbs: Option<u32>,
    ) -> Result<()>;
}

/// [`EngineProxy`] over a worker command channel.
#[derive(Debug, Clone)]
pub struct ChannelProxy {
    commands: mpsc::Sender<WorkerRequest>,
}

impl ChannelProxy {
    pub fn new(commands: mpsc::Sender<WorkerRequest>) -> Self {
        Self { commands }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn call(&self, command: WorkerCommand) -> Result<CommandResponse> {
        let name = command.name();
        let (request, response) = WorkerRequest::new(command);

        self.commands.send(request).await.map_err(|_| {
            tracing::debug!(command = name, "worker gone, command not delivered");
            ClientError::Disconnected
        })?;

        // The sender half is dropped unanswered when the worker shuts down
        // with the request still queued.
        let outcome = response.await.map_err(|_| ClientError::Disconnected)?;
        Ok(outcome?)
    }

    async fn call_done(&self, command: WorkerCommand) -> Result<()> {
        let name = command.name();
        match self.call(command).await? {
            CommandResponse::Done => Ok(()),
            _ => Err(ClientError::UnexpectedResponse(name)),
        }
    }
}

#[async_trait::async_trait]
impl EngineProxy for ChannelProxy {
    async fn start(&self, config: ClientConfig) -> Result<()> {
        self.call_done(WorkerCommand::Start(Box::new(config))).await
    }

    async fn stop(&self) -> Result<()> {
        self.call_done(WorkerCommand::Stop).await
    }

    async fn self_address(&self) -> Result<Option<String>> {
        match self.call(WorkerCommand::SelfAddress).await? {
            CommandResponse::SelfAddress(address) => Ok(address),
            _ => Err(ClientError::UnexpectedResponse("self_address")),
        }
    }

    async fn send_bytes(
        &self,
        message: Bytes,
        recipient: String,
        reply_surbs: Option<u32>,
    ) -> Result<()> {
        self.call_done(WorkerCommand::Send {
            message,
            recipient,
            reply_surbs,
        })
        .await
    }
}
