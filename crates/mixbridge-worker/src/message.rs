//! Messages crossing the worker boundary.

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::config::ClientConfig;
use crate::error::EngineError;

/// Engine → caller notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// The engine is ready for commands. Sent once, first.
    Loaded,
    /// The engine connected to the mixnet.
    Connected { address: Option<String> },
    /// A message arrived from the mixnet, framing included.
    RawMessageReceived { payload: Bytes },
    /// The engine failed. Before `Loaded` this fails the bootstrap.
    Error { reason: String },
}

impl WorkerMessage {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerMessage::Loaded => "Loaded",
            WorkerMessage::Connected { .. } => "Connected",
            WorkerMessage::RawMessageReceived { .. } => "RawMessageReceived",
            WorkerMessage::Error { .. } => "Error",
        }
    }
}

/// Caller → engine commands.
#[derive(Debug, Clone)]
pub enum WorkerCommand {
    Start(Box<ClientConfig>),
    Stop,
    SelfAddress,
    Send {
        message: Bytes,
        recipient: String,
        reply_surbs: Option<u32>,
    },
}

impl WorkerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            WorkerCommand::Start(_) => "start",
            WorkerCommand::Stop => "stop",
            WorkerCommand::SelfAddress => "self_address",
            WorkerCommand::Send { .. } => "send",
        }
    }
}

/// Successful command outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    Done,
    SelfAddress(Option<String>),
}

/// A command plus the channel its response goes back on.
#[derive(Debug)]
pub struct WorkerRequest {
    pub command: WorkerCommand,
    pub reply: oneshot::Sender<Result<CommandResponse, EngineError>>,
}

impl WorkerRequest {
    /// Pair a command with a fresh reply channel.
    pub fn new(
        command: WorkerCommand,
    ) -> (
        Self,
        oneshot::Receiver<Result<CommandResponse, EngineError>>,
    ) {
        let (reply, response) = oneshot::channel();
        (Self { command, reply }, response)
    }
}
