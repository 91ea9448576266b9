use std::time::Duration;

/// Errors reported by an engine while handling a command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The command needs a started client.
    #[error("client not started")]
    NotStarted,

    /// `start` was called on a running client.
    #[error("client already started")]
    AlreadyStarted,

    /// The start configuration was rejected.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The recipient is not a well-formed mixnet address.
    #[error("invalid recipient '{0}'")]
    InvalidRecipient(String),

    /// Any other engine-side failure.
    #[error("{0}")]
    Failed(String),
}

/// Errors that can occur while bringing up a worker context.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The background thread could not be launched.
    #[error("failed to launch worker: {0}")]
    Launch(#[source] std::io::Error),

    /// The engine reported a startup failure instead of `Loaded`.
    #[error("engine failed to load: {0}")]
    Engine(String),

    /// The first message was something other than `Loaded`.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The worker went away before sending anything.
    #[error("worker exited before the loaded handshake")]
    Disconnected,

    /// No `Loaded` message within the configured window.
    #[error("worker not ready after {0:?}")]
    Timeout(Duration),
}

/// Errors on an established worker handle.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker is no longer accepting commands.
    #[error("worker disconnected")]
    Disconnected,

    /// The worker thread panicked.
    #[error("worker thread panicked")]
    Panicked,
}

pub type Result<T> = std::result::Result<T, WorkerError>;
