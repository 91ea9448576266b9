/// Errors that can occur in event bus operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The name does not match any event kind.
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),
}

pub type Result<T> = std::result::Result<T, EventError>;
