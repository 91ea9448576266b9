use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use mixbridge_codec::{TextMimeTypes, TEXT_PLAIN};
use mixbridge_events::EventKind;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod envinfo;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Boot a loopback client, message ourselves and print the events.
    Echo(EchoArgs),
    /// Frame a payload the way `send` puts it on the wire.
    Encode(EncodeArgs),
    /// Unframe a payload and print what a receiver would see.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Echo(args) => echo::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Client identifier.
    #[arg(long, env = "MIXBRIDGE_CLIENT_ID", default_value = "mixbridge-echo")]
    pub client_id: String,
    /// API used to fetch the network topology.
    #[arg(long, env = "MIXBRIDGE_NYM_API_URL", default_value = "http://localhost:8080")]
    pub nym_api_url: String,
    /// Preferred gateway identity key.
    #[arg(long, env = "MIXBRIDGE_GATEWAY")]
    pub gateway: Option<String>,
    /// Start configuration as JSON (camelCase). Overrides the flags above.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Number of messages to send.
    #[arg(long, default_value = "1")]
    pub count: usize,
    /// Message body.
    #[arg(long, default_value = "hello")]
    pub message: String,
    /// MIME type of the message.
    #[arg(long, default_value = TEXT_PLAIN)]
    pub mime_type: String,
    /// MIME types treated as text (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub text_mime_types: Option<Vec<String>>,
    /// Also print raw message events.
    #[arg(long)]
    pub raw: bool,
    /// Event kinds to print (comma-separated, e.g. connected,string,binary,raw).
    /// Overrides `--raw`.
    #[arg(long, value_delimiter = ',', value_name = "KINDS")]
    pub events: Option<Vec<EventKind>>,
    /// Give up waiting for the engine or messages after this long (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// MIME type of the payload.
    #[arg(long, default_value = TEXT_PLAIN)]
    pub mime_type: String,
    /// Headers to attach (usually a JSON document).
    #[arg(long)]
    pub headers: Option<String>,
    /// String payload.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
    /// Send the payload as binary even if the MIME type is a text type.
    #[arg(long)]
    pub binary: bool,
    /// MIME types treated as text (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub text_mime_types: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Base64 of a framed payload.
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    pub base64: Option<String>,
    /// Read the framed payload from a file.
    #[arg(long, conflicts_with = "base64")]
    pub file: Option<PathBuf>,
    /// MIME types treated as text (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub text_mime_types: Option<Vec<String>>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

pub(crate) fn text_mime_types(types: Option<&[String]>) -> TextMimeTypes {
    match types {
        Some(types) => TextMimeTypes::new(types.iter().cloned()),
        None => TextMimeTypes::default(),
    }
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}
