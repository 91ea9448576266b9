/// Errors that can occur during payload encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A text body was given without a MIME type from the text set.
    #[error("text message needs a text mime type (got {})", .mime_type.as_deref().unwrap_or("none"))]
    NotTextMime { mime_type: Option<String> },

    /// The input ended before the framing was complete.
    #[error("payload truncated ({len} bytes, need at least {needed})")]
    Truncated { len: usize, needed: usize },

    /// The declared metadata block exceeds the configured maximum.
    #[error("payload metadata too large ({size} bytes, max {max})")]
    MetadataTooLarge { size: usize, max: usize },

    /// The metadata block is not valid JSON.
    #[error("invalid payload metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// The body of a text-typed payload is not valid UTF-8.
    #[error("payload tagged {mime_type} is not valid UTF-8")]
    InvalidUtf8 { mime_type: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
