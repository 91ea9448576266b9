use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mixbridge_codec::DecodedPayload;
use mixbridge_events::Event;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
struct EventOutput<'a> {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    headers: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<&'a str>,
    size: usize,
    payload: String,
    timestamp: String,
}

impl<'a> EventOutput<'a> {
    fn from_event(event: &'a Event) -> Self {
        let mut out = EventOutput {
            kind: event.kind().as_str(),
            mime_type: None,
            headers: None,
            address: None,
            size: 0,
            payload: String::new(),
            timestamp: now_unix_seconds(),
        };
        match event {
            Event::Loaded(_) => {}
            Event::Connected(connected) => out.address = connected.address.as_deref(),
            Event::StringMessageReceived(message) => {
                out.mime_type = Some(&message.mime_type);
                out.headers = message.headers.as_deref();
                out.size = message.payload_raw.len();
                out.payload = message.payload.clone();
            }
            Event::BinaryMessageReceived(message) => {
                out.mime_type = Some(&message.mime_type);
                out.headers = message.headers.as_deref();
                out.size = message.payload.len();
                out.payload = payload_preview(&message.payload);
            }
            Event::RawMessageReceived(message) => {
                out.size = message.payload.len();
                out.payload = format!("<framed {} bytes>", message.payload.len());
            }
        }
        out
    }
}

pub fn print_event(event: &Event, format: OutputFormat) {
    let out = EventOutput::from_event(event);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "MIME TYPE", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    out.kind.to_string(),
                    out.mime_type.unwrap_or("-").to_string(),
                    out.size.to_string(),
                    out.address.map(str::to_string).unwrap_or(out.payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "event={} mime_type={} size={} payload={}",
                out.kind,
                out.mime_type.unwrap_or("-"),
                out.size,
                out.address.map(str::to_string).unwrap_or(out.payload)
            );
        }
        OutputFormat::Raw => match event {
            Event::StringMessageReceived(message) => print_raw(&message.payload_raw),
            Event::BinaryMessageReceived(message) => print_raw(&message.payload),
            _ => {}
        },
    }
}

#[derive(Serialize)]
struct DecodedOutput<'a> {
    mime_type: &'a str,
    headers: Option<&'a str>,
    is_text: bool,
    size: usize,
    payload: String,
}

pub fn print_decoded(decoded: &DecodedPayload, format: OutputFormat) {
    let out = DecodedOutput {
        mime_type: &decoded.mime_type,
        headers: decoded.headers.as_deref(),
        is_text: decoded.is_text(),
        size: decoded.raw.len(),
        payload: decoded
            .text
            .clone()
            .unwrap_or_else(|| payload_preview(&decoded.raw)),
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["MIME TYPE", "HEADERS", "TEXT", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    out.mime_type.to_string(),
                    out.headers.unwrap_or("-").to_string(),
                    out.is_text.to_string(),
                    out.size.to_string(),
                    out.payload,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "mime_type={} headers={} text={} size={} payload={}",
            out.mime_type,
            out.headers.unwrap_or("-"),
            out.is_text,
            out.size,
            out.payload
        ),
        OutputFormat::Raw => print_raw(&decoded.raw),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
