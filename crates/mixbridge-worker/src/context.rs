use std::fmt;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::BootstrapConfig;
use crate::engine::{Engine, EngineEvents};
use crate::error::{BootstrapError, EngineError, Result, WorkerError};
use crate::message::{CommandResponse, WorkerCommand, WorkerMessage, WorkerRequest};

/// Caller-side handle to a running worker context.
///
/// Dropping the handle cancels the context; the engine is stopped and the
/// thread exits on its own.
pub struct WorkerHandle {
    commands: mpsc::Sender<WorkerRequest>,
    messages: Option<mpsc::UnboundedReceiver<WorkerMessage>>,
    cancel: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Sender for command requests.
    pub fn commands(&self) -> mpsc::Sender<WorkerRequest> {
        self.commands.clone()
    }

    /// Take the inbound message stream. Only the first call returns it.
    pub fn take_messages(&mut self) -> Option<mpsc::UnboundedReceiver<WorkerMessage>> {
        self.messages.take()
    }

    /// Await the next inbound message while the stream is still owned here.
    pub async fn recv(&mut self) -> Option<WorkerMessage> {
        match self.messages.as_mut() {
            Some(messages) => messages.recv().await,
            None => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }

    /// Cancel the context and wait for its thread to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(WorkerError::Panicked),
            Err(err) => {
                tracing::warn!(error = %err, "join task for worker thread failed");
                Err(WorkerError::Panicked)
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("terminated", &self.is_terminated())
            .field("messages_taken", &self.messages.is_none())
            .finish_non_exhaustive()
    }
}

/// Launch a worker context hosting the engine built by `factory`.
///
/// The factory runs on the worker thread. The first message the context
/// posts is `Loaded` if the engine was built, or `Error` otherwise.
pub fn spawn<E, F>(
    factory: F,
    config: &BootstrapConfig,
) -> std::result::Result<WorkerHandle, BootstrapError>
where
    E: Engine,
    F: FnOnce(EngineEvents) -> std::result::Result<E, EngineError> + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(config.command_queue_capacity.max(1));
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();

    let thread = std::thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || run_worker(factory, command_rx, message_tx, worker_cancel))
        .map_err(BootstrapError::Launch)?;

    tracing::debug!(thread = %config.thread_name, "worker context launched");

    Ok(WorkerHandle {
        commands: command_tx,
        messages: Some(message_rx),
        cancel,
        thread: Some(thread),
    })
}

fn run_worker<E, F>(
    factory: F,
    commands: mpsc::Receiver<WorkerRequest>,
    messages: mpsc::UnboundedSender<WorkerMessage>,
    cancel: CancellationToken,
) where
    E: Engine,
    F: FnOnce(EngineEvents) -> std::result::Result<E, EngineError>,
{
    let events = EngineEvents::new(messages);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            events.error(format!("failed to build worker runtime: {err}"));
            return;
        }
    };

    runtime.block_on(async move {
        let engine = match factory(events.clone()) {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!(error = %err, "engine failed to load");
                events.error(err.to_string());
                return;
            }
        };

        events.post(WorkerMessage::Loaded);
        serve(engine, commands, cancel).await;
    });

    tracing::debug!("worker context exited");
}

async fn serve<E: Engine>(
    mut engine: E,
    mut commands: mpsc::Receiver<WorkerRequest>,
    cancel: CancellationToken,
) {
    loop {
        let request = tokio::select! {
            _ = cancel.cancelled() => break,
            request = commands.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };

        let name = request.command.name();
        let outcome = execute(&mut engine, request.command).await;
        if let Err(err) = &outcome {
            tracing::debug!(command = name, error = %err, "engine command failed");
        }
        if request.reply.send(outcome).is_err() {
            tracing::debug!(command = name, "caller dropped before the response arrived");
        }
    }

    if let Err(err) = engine.stop().await {
        tracing::warn!(error = %err, "engine stop during shutdown failed");
    }
}

async fn execute<E: Engine>(
    engine: &mut E,
    command: WorkerCommand,
) -> std::result::Result<CommandResponse, EngineError> {
    match command {
        WorkerCommand::Start(config) => engine
            .start(*config)
            .await
            .map(|()| CommandResponse::Done),
        WorkerCommand::Stop => engine.stop().await.map(|()| CommandResponse::Done),
        WorkerCommand::SelfAddress => Ok(CommandResponse::SelfAddress(engine.self_address())),
        WorkerCommand::Send {
            message,
            recipient,
            reply_surbs,
        } => engine
            .send(message, recipient, reply_surbs)
            .await
            .map(|()| CommandResponse::Done),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::config::ClientConfig;
    use crate::loopback::LoopbackEngine;

    fn spawn_loopback() -> WorkerHandle {
        spawn(
            |events| Ok(LoopbackEngine::new(events)),
            &BootstrapConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn first_message_is_loaded() {
        let mut handle = spawn_loopback();
        assert_eq!(handle.recv().await, Some(WorkerMessage::Loaded));
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn factory_error_is_first_message() {
        let mut handle = spawn(
            |_events| -> std::result::Result<LoopbackEngine, EngineError> {
                Err(EngineError::Failed("no wasm".to_string()))
            },
            &BootstrapConfig::default(),
        )
        .unwrap();

        assert_eq!(
            handle.recv().await,
            Some(WorkerMessage::Error {
                reason: "no wasm".to_string()
            })
        );
        // The context exits after a failed load.
        assert_eq!(handle.recv().await, None);
    }

    #[tokio::test]
    async fn commands_get_responses() {
        let mut handle = spawn_loopback();
        assert_eq!(handle.recv().await, Some(WorkerMessage::Loaded));

        let (request, response) = WorkerRequest::new(WorkerCommand::SelfAddress);
        handle.commands().send(request).await.unwrap();
        assert_eq!(
            response.await.unwrap(),
            Ok(CommandResponse::SelfAddress(None))
        );

        let config = ClientConfig::new("c1", "http://api");
        let (request, response) = WorkerRequest::new(WorkerCommand::Start(Box::new(config)));
        handle.commands().send(request).await.unwrap();
        assert_eq!(response.await.unwrap(), Ok(CommandResponse::Done));
        assert!(matches!(
            handle.recv().await,
            Some(WorkerMessage::Connected { address: Some(_) })
        ));

        let (request, response) = WorkerRequest::new(WorkerCommand::Send {
            message: Bytes::from_static(b"x"),
            recipient: "c1.loopback@loopback-gateway".to_string(),
            reply_surbs: None,
        });
        handle.commands().send(request).await.unwrap();
        assert_eq!(response.await.unwrap(), Ok(CommandResponse::Done));
        assert_eq!(
            handle.recv().await,
            Some(WorkerMessage::RawMessageReceived {
                payload: Bytes::from_static(b"x")
            })
        );

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn terminated_worker_rejects_commands() {
        let mut handle = spawn_loopback();
        assert_eq!(handle.recv().await, Some(WorkerMessage::Loaded));
        let commands = handle.commands();

        handle.shutdown().await.unwrap();

        let (request, _response) = WorkerRequest::new(WorkerCommand::Stop);
        assert!(commands.send(request).await.is_err());
    }

    #[tokio::test]
    async fn dropping_handle_stops_context() {
        let mut handle = spawn_loopback();
        let mut messages = handle.take_messages().unwrap();
        assert_eq!(messages.recv().await, Some(WorkerMessage::Loaded));
        let commands = handle.commands();

        drop(handle);

        let closed = tokio::time::timeout(std::time::Duration::from_secs(5), messages.recv())
            .await
            .expect("worker should exit after its handle is dropped");
        assert_eq!(closed, None);
        assert!(commands.is_closed());
    }

    #[tokio::test]
    async fn take_messages_only_once() {
        let mut handle = spawn_loopback();
        assert!(handle.take_messages().is_some());
        assert!(handle.take_messages().is_none());
        assert_eq!(handle.recv().await, None);
    }
}
