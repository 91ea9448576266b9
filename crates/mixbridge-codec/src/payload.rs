use bytes::Bytes;

/// Body of an outbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(String),
    Binary(Bytes),
}

impl Message {
    pub fn len(&self) -> usize {
        match self {
            Message::Text(text) => text.len(),
            Message::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::Text(value)
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::Text(value.to_string())
    }
}

impl From<Bytes> for Message {
    fn from(value: Bytes) -> Self {
        Message::Binary(value)
    }
}

impl From<Vec<u8>> for Message {
    fn from(value: Vec<u8>) -> Self {
        Message::Binary(Bytes::from(value))
    }
}

/// An outbound message before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Text or binary body.
    pub message: Message,
    /// MIME type of the body. Required for text bodies.
    pub mime_type: Option<String>,
    /// Free-form headers, typically a JSON document.
    pub headers: Option<String>,
}

impl Payload {
    /// Create a payload with no MIME type or headers.
    pub fn new(message: impl Into<Message>) -> Self {
        Self {
            message: message.into(),
            mime_type: None,
            headers: None,
        }
    }

    /// Create a text payload tagged with `mime_type`.
    pub fn text(message: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            message: Message::Text(message.into()),
            mime_type: Some(mime_type.into()),
            headers: None,
        }
    }

    /// Create a binary payload tagged with `mime_type`.
    pub fn binary(message: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        Self {
            message: Message::Binary(message.into()),
            mime_type: Some(mime_type.into()),
            headers: None,
        }
    }

    /// Attach headers.
    pub fn with_headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Attach or replace the MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// An inbound message after framing has been removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    /// MIME type declared by the sender.
    pub mime_type: String,
    /// Body bytes exactly as sent.
    pub raw: Bytes,
    /// Headers declared by the sender.
    pub headers: Option<String>,
    /// UTF-8 body, present only when `mime_type` is in the text set.
    pub text: Option<String>,
}

impl DecodedPayload {
    /// Returns true if the body was interpreted as text.
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }
}
