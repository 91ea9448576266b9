use std::fmt;
use std::io;

use mixbridge_client::ClientError;
use mixbridge_codec::CodecError;
use mixbridge_worker::{BootstrapError, EngineError};

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    match err {
        CodecError::NotTextMime { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn engine_error(context: &str, err: EngineError) -> CliError {
    match err {
        EngineError::InvalidConfig(_) | EngineError::InvalidRecipient(_) => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        EngineError::NotStarted | EngineError::AlreadyStarted => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
        EngineError::Failed(_) => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Bootstrap(BootstrapError::Timeout(_)) => {
            CliError::new(TIMEOUT, format!("{context}: {err}"))
        }
        ClientError::Bootstrap(BootstrapError::Launch(source)) => io_error(context, source),
        ClientError::Bootstrap(other) => CliError::new(FAILURE, format!("{context}: {other}")),
        ClientError::Codec(err) => codec_error(context, err),
        ClientError::Engine(err) => engine_error(context, err),
        ClientError::Disconnected => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn maps_client_errors_to_exit_codes() {
        let timeout = ClientError::Bootstrap(BootstrapError::Timeout(Duration::from_secs(1)));
        assert_eq!(client_error("boot", timeout).code, TIMEOUT);
        assert_eq!(
            client_error("send", ClientError::Disconnected).code,
            TRANSPORT_ERROR
        );
        let bad_recipient = ClientError::Engine(EngineError::InvalidRecipient("x".to_string()));
        assert_eq!(client_error("send", bad_recipient).code, USAGE);
        let truncated = ClientError::Codec(CodecError::Truncated { len: 1, needed: 8 });
        assert_eq!(client_error("decode", truncated).code, DATA_INVALID);
    }

    #[test]
    fn message_keeps_context() {
        let err = client_error("start failed", ClientError::Disconnected);
        assert_eq!(err.to_string(), "start failed: client disconnected");
    }
}
