use mixbridge_codec::CodecError;
use mixbridge_worker::{BootstrapError, EngineError, WorkerError};

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The background context could not be brought up.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),

    /// The payload could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The engine rejected the command.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Tearing down the background context failed.
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// The background context is gone.
    #[error("client disconnected")]
    Disconnected,

    /// The engine answered a command with the wrong kind of response.
    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}

pub type Result<T> = std::result::Result<T, ClientError>;
