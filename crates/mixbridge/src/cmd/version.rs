use mixbridge_codec::{TextMimeTypes, DEFAULT_MAX_METADATA, LENGTH_PREFIX_SIZE};
use mixbridge_events::EventKind;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("mixbridge {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    for (key, value) in extended_lines() {
        println!("{key}: {value}");
    }
    Ok(SUCCESS)
}

fn extended_lines() -> Vec<(&'static str, String)> {
    let kinds: Vec<&str> = EventKind::ALL.iter().map(|kind| kind.as_str()).collect();
    vec![
        ("mixbridge", env!("CARGO_PKG_VERSION").to_string()),
        (
            "build_target",
            option_env!("MIXBRIDGE_BUILD_TARGET")
                .unwrap_or("unknown")
                .to_string(),
        ),
        (
            "framing",
            format!(
                "{}-byte big-endian metadata length, JSON metadata (max {} KiB), body",
                LENGTH_PREFIX_SIZE,
                DEFAULT_MAX_METADATA / 1024
            ),
        ),
        (
            "text_mime_types",
            TextMimeTypes::default().to_vec().join(", "),
        ),
        ("events", kinds.join(", ")),
        ("engines", "loopback".to_string()),
    ]
}
