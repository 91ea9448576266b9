use std::fs;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use mixbridge_codec::PayloadCodec;

use crate::cmd::{text_mime_types, DecodeArgs};
use crate::exit::{codec_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let framed = read_input(&args)?;
    let text_types = text_mime_types(args.text_mime_types.as_deref());
    let codec = PayloadCodec::with_text_mime_types(text_types);

    let decoded = codec
        .decode(&framed)
        .map_err(|err| codec_error("decode failed", err))?;
    tracing::debug!(
        mime_type = %decoded.mime_type,
        size = decoded.raw.len(),
        text = decoded.is_text(),
        "payload decoded"
    );

    print_decoded(&decoded, format);
    Ok(SUCCESS)
}

fn read_input(args: &DecodeArgs) -> CliResult<Bytes> {
    if let Some(encoded) = &args.base64 {
        return STANDARD
            .decode(encoded.trim())
            .map(Bytes::from)
            .map_err(|err| CliError::new(USAGE, format!("--base64 is not valid base64: {err}")));
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map(Bytes::from)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Err(CliError::new(USAGE, "one of --base64 or --file is required"))
}
