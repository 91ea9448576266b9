use std::fs;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use mixbridge_codec::{Payload, PayloadCodec};
use serde::Serialize;

use crate::cmd::{text_mime_types, EncodeArgs};
use crate::exit::{codec_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    mime_type: &'a str,
    is_text: bool,
    size: usize,
    base64: String,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let text_types = text_mime_types(args.text_mime_types.as_deref());
    let codec = PayloadCodec::with_text_mime_types(text_types);
    let payload = build_payload(&args, &codec)?;
    let is_text = payload.message.is_text();

    let framed = codec
        .encode(&payload)
        .map_err(|err| codec_error("encode failed", err))?;
    tracing::debug!(mime_type = %args.mime_type, size = framed.len(), "payload framed");

    let out = EncodeOutput {
        mime_type: &args.mime_type,
        is_text,
        size: framed.len(),
        base64: STANDARD.encode(&framed),
    };
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        ),
        OutputFormat::Table | OutputFormat::Pretty => println!("{}", out.base64),
        OutputFormat::Raw => print_raw(&framed),
    }
    Ok(SUCCESS)
}

fn build_payload(args: &EncodeArgs, codec: &PayloadCodec) -> CliResult<Payload> {
    let body = match (&args.data, &args.file) {
        (Some(data), _) => Bytes::copy_from_slice(data.as_bytes()),
        (None, Some(path)) => fs::read(path)
            .map(Bytes::from)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => Bytes::new(),
    };

    let payload = if args.binary || !codec.is_text_mime(&args.mime_type) {
        Payload::binary(body, args.mime_type.as_str())
    } else {
        let text = String::from_utf8(body.to_vec()).map_err(|_| {
            CliError::new(
                DATA_INVALID,
                format!("payload is not valid UTF-8 for {}", args.mime_type),
            )
        })?;
        Payload::text(text, args.mime_type.as_str())
    };

    Ok(match &args.headers {
        Some(headers) => payload.with_headers(headers.as_str()),
        None => payload,
    })
}
