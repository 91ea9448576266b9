mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mixbridge", version, about = "Mixnet client bridge CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use mixbridge_events::EventKind;

    use super::*;

    #[test]
    fn parses_echo_subcommand() {
        let cli = Cli::try_parse_from([
            "mixbridge",
            "echo",
            "--client-id",
            "alice",
            "--count",
            "3",
            "--mime-type",
            "application/json",
            "--message",
            "{}",
        ])
        .expect("echo args should parse");

        let Command::Echo(args) = cli.command else {
            panic!("expected echo");
        };
        assert_eq!(args.client_id, "alice");
        assert_eq!(args.count, 3);
    }

    #[test]
    fn parses_echo_event_filter() {
        let cli = Cli::try_parse_from(["mixbridge", "echo", "--events", "string,Raw"])
            .expect("event kinds should parse");

        let Command::Echo(args) = cli.command else {
            panic!("expected echo");
        };
        assert_eq!(
            args.events,
            Some(vec![
                EventKind::StringMessageReceived,
                EventKind::RawMessageReceived
            ])
        );
    }

    #[test]
    fn rejects_unknown_event_kind() {
        let err = Cli::try_parse_from(["mixbridge", "echo", "--events", "string,bogus"])
            .expect_err("unknown kind should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "mixbridge",
            "encode",
            "--data",
            "hello",
            "--file",
            "/tmp/payload.bin",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn decode_requires_input() {
        let err = Cli::try_parse_from(["mixbridge", "decode"]).expect_err("missing input");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_text_mime_type_list() {
        let cli = Cli::try_parse_from([
            "mixbridge",
            "decode",
            "--base64",
            "AA==",
            "--text-mime-types",
            "text/plain,text/html",
        ])
        .expect("decode args should parse");

        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(
            args.text_mime_types,
            Some(vec!["text/plain".to_string(), "text/html".to_string()])
        );
    }
}
