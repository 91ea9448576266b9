use std::fs;
use std::time::Duration;

use bytes::Bytes;
use mixbridge_client::{create_loopback_client, ClientOptions, MixnetClient, SendRequest};
use mixbridge_codec::Payload;
use mixbridge_events::{Event, EventKind};
use mixbridge_worker::ClientConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cmd::{parse_duration, EchoArgs};
use crate::exit::{
    client_error, io_error, CliError, CliResult, DATA_INVALID, FAILURE, INTERNAL, SUCCESS,
    TIMEOUT, TRANSPORT_ERROR,
};
use crate::output::{print_event, OutputFormat};

pub fn run(args: EchoArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = load_config(&args)?;

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| io_error("runtime setup failed", err))?;
    runtime.block_on(echo(args, config, timeout, cancel, format))
}

async fn echo(
    args: EchoArgs,
    config: ClientConfig,
    timeout: Duration,
    cancel: CancellationToken,
    format: OutputFormat,
) -> CliResult<i32> {
    let mut options = ClientOptions::default().with_ready_timeout(timeout);
    if let Some(types) = &args.text_mime_types {
        options = options.with_text_mime_types(types.iter().cloned());
    }
    let client = create_loopback_client(options)
        .await
        .map_err(|err| client_error("client bootstrap failed", err))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    for kind in [
        EventKind::Connected,
        EventKind::StringMessageReceived,
        EventKind::BinaryMessageReceived,
        EventKind::RawMessageReceived,
    ] {
        let tx = tx.clone();
        client.events().add_subscription(kind, move |event: &Event| {
            let _ = tx.send(event.clone());
        });
    }

    let waiter = EventWaiter {
        events: &mut rx,
        timeout,
        cancel: &cancel,
    };
    let printer = EventPrinter {
        kinds: printed_kinds(&args),
        format,
    };
    let result = exchange(&client, &args, config, waiter, &printer).await;

    if let Err(err) = client.stop().await {
        tracing::warn!(error = %err, "stopping client failed");
    }
    client
        .close()
        .await
        .map_err(|err| client_error("client shutdown failed", err))?;
    result
}

async fn exchange(
    client: &MixnetClient,
    args: &EchoArgs,
    config: ClientConfig,
    mut waiter: EventWaiter<'_>,
    printer: &EventPrinter,
) -> CliResult<i32> {
    client
        .start(config)
        .await
        .map_err(|err| client_error("start failed", err))?;

    let Some(connected) = waiter.next("connection").await? else {
        return Ok(SUCCESS);
    };
    printer.print(&connected);

    let address = client
        .self_address()
        .await
        .map_err(|err| client_error("address lookup failed", err))?
        .ok_or_else(|| CliError::new(FAILURE, "engine reported no address"))?;
    tracing::info!(%address, count = args.count, "sending to self");

    for _ in 0..args.count {
        let payload = if client.codec().is_text_mime(&args.mime_type) {
            Payload::text(args.message.as_str(), args.mime_type.as_str())
        } else {
            Payload::binary(Bytes::from(args.message.clone()), args.mime_type.as_str())
        };
        client
            .send(SendRequest::new(payload, address.as_str()))
            .await
            .map_err(|err| client_error("send failed", err))?;
    }

    let mut received = 0usize;
    while received < args.count {
        let Some(event) = waiter.next("echoed message").await? else {
            break;
        };
        printer.print(&event);
        if matches!(
            event.kind(),
            EventKind::StringMessageReceived | EventKind::BinaryMessageReceived
        ) {
            received = received.saturating_add(1);
        }
    }

    Ok(SUCCESS)
}

/// Prints the subset of events the user asked for.
struct EventPrinter {
    kinds: Vec<EventKind>,
    format: OutputFormat,
}

impl EventPrinter {
    fn print(&self, event: &Event) {
        if self.kinds.contains(&event.kind()) {
            print_event(event, self.format);
        }
    }
}

fn printed_kinds(args: &EchoArgs) -> Vec<EventKind> {
    if let Some(kinds) = &args.events {
        return kinds.clone();
    }
    let mut kinds = vec![
        EventKind::Connected,
        EventKind::StringMessageReceived,
        EventKind::BinaryMessageReceived,
    ];
    if args.raw {
        kinds.push(EventKind::RawMessageReceived);
    }
    kinds
}

struct EventWaiter<'a> {
    events: &'a mut mpsc::UnboundedReceiver<Event>,
    timeout: Duration,
    cancel: &'a CancellationToken,
}

impl EventWaiter<'_> {
    /// Next event, or `None` once interrupted.
    async fn next(&mut self, what: &str) -> CliResult<Option<Event>> {
        tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::info!("interrupted");
                Ok(None)
            }
            event = tokio::time::timeout(self.timeout, self.events.recv()) => match event {
                Ok(Some(event)) => Ok(Some(event)),
                Ok(None) => Err(CliError::new(
                    TRANSPORT_ERROR,
                    format!("event stream closed while waiting for {what}"),
                )),
                Err(_) => Err(CliError::new(
                    TIMEOUT,
                    format!("timed out after {:?} waiting for {what}", self.timeout),
                )),
            },
        }
    }
}

fn load_config(args: &EchoArgs) -> CliResult<ClientConfig> {
    if let Some(path) = &args.config {
        let json = fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
        return ClientConfig::from_json_str(&json)
            .map_err(|err| CliError::new(DATA_INVALID, format!("invalid config: {err}")));
    }

    let config = ClientConfig::new(args.client_id.as_str(), args.nym_api_url.as_str());
    Ok(match &args.gateway {
        Some(gateway) => config.with_preferred_gateway(gateway.as_str()),
        None => config,
    })
}

fn install_ctrlc_handler(cancel: CancellationToken) -> CliResult<()> {
    ctrlc::set_handler(move || cancel.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> EchoArgs {
        EchoArgs {
            client_id: "cli".to_string(),
            nym_api_url: "http://localhost:8080".to_string(),
            gateway: None,
            config: None,
            count: 1,
            message: "hello".to_string(),
            mime_type: "text/plain".to_string(),
            text_mime_types: None,
            raw: false,
            events: None,
            timeout: "5s".to_string(),
        }
    }

    #[test]
    fn config_from_flags() {
        let mut args = args();
        args.gateway = Some("gw".to_string());
        let config = load_config(&args).unwrap();
        assert_eq!(config.client_id, "cli");
        assert_eq!(config.preferred_gateway_identity_key.as_deref(), Some("gw"));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let mut args = args();
        args.config = Some("/nonexistent/mixbridge-config.json".into());
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn printed_kinds_follow_flags() {
        let mut args = args();
        assert!(!printed_kinds(&args).contains(&EventKind::RawMessageReceived));

        args.raw = true;
        assert!(printed_kinds(&args).contains(&EventKind::RawMessageReceived));

        args.events = Some(vec![EventKind::BinaryMessageReceived]);
        assert_eq!(printed_kinds(&args), [EventKind::BinaryMessageReceived]);
    }

    #[tokio::test]
    async fn waiter_times_out() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let cancel = CancellationToken::new();
        let mut waiter = EventWaiter {
            events: &mut rx,
            timeout: Duration::from_millis(20),
            cancel: &cancel,
        };
        assert_eq!(waiter.next("test").await.unwrap_err().code, TIMEOUT);
    }

    #[tokio::test]
    async fn waiter_returns_none_when_cancelled() {
        let (_tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut waiter = EventWaiter {
            events: &mut rx,
            timeout: Duration::from_secs(5),
            cancel: &cancel,
        };
        assert!(waiter.next("test").await.unwrap().is_none());
    }
}
