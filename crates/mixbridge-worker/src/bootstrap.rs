use std::time::Duration;

use crate::config::BootstrapConfig;
use crate::context::{spawn, WorkerHandle};
use crate::engine::{Engine, EngineEvents};
use crate::error::{BootstrapError, EngineError};
use crate::message::WorkerMessage;

/// Launch a worker context and wait for its `Loaded` handshake.
///
/// Resolves with the handle once the first message is `Loaded`. Any other
/// first message rejects, and the context is torn down with the handle.
pub async fn bootstrap<E, F>(
    factory: F,
    config: &BootstrapConfig,
) -> Result<WorkerHandle, BootstrapError>
where
    E: Engine,
    F: FnOnce(EngineEvents) -> Result<E, EngineError> + Send + 'static,
{
    let mut handle = spawn(factory, config)?;

    let first = match config.ready_timeout {
        Some(timeout) => recv_with_timeout(&mut handle, timeout).await?,
        None => handle.recv().await,
    };

    match first {
        Some(WorkerMessage::Loaded) => {
            tracing::debug!("worker loaded");
            Ok(handle)
        }
        Some(WorkerMessage::Error { reason }) => {
            tracing::warn!(%reason, "worker failed before loading");
            Err(BootstrapError::Engine(reason))
        }
        Some(other) => Err(BootstrapError::Protocol(format!(
            "expected Loaded as first message, got {}",
            other.name()
        ))),
        None => Err(BootstrapError::Disconnected),
    }
}

async fn recv_with_timeout(
    handle: &mut WorkerHandle,
    timeout: Duration,
) -> Result<Option<WorkerMessage>, BootstrapError> {
    tokio::time::timeout(timeout, handle.recv())
        .await
        .map_err(|_| BootstrapError::Timeout(timeout))
}
