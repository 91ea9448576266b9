use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;

use crate::error::{CodecError, Result};
use crate::framing::{JsonMetadataFraming, PayloadFraming, PayloadMetadata};
use crate::mime::{TextMimeTypes, APPLICATION_OCTET_STREAM};
use crate::payload::{DecodedPayload, Message, Payload};

/// Encodes outbound payloads and decodes inbound ones.
///
/// Clones share the same text MIME set, so a change made through one handle
/// is seen by every other.
#[derive(Clone)]
pub struct PayloadCodec {
    text_mime_types: Arc<RwLock<TextMimeTypes>>,
    framing: Arc<dyn PayloadFraming>,
}

impl PayloadCodec {
    /// Codec with the default text set and JSON metadata framing.
    pub fn new() -> Self {
        Self::with_text_mime_types(TextMimeTypes::default())
    }

    pub fn with_text_mime_types(text_mime_types: TextMimeTypes) -> Self {
        Self {
            text_mime_types: Arc::new(RwLock::new(text_mime_types)),
            framing: Arc::new(JsonMetadataFraming::new()),
        }
    }

    /// Override the wire framing.
    pub fn with_framing(mut self, framing: Arc<dyn PayloadFraming>) -> Self {
        self.framing = framing;
        self
    }

    /// Replace the text MIME set.
    pub fn set_text_mime_types<I, S>(&self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_set().replace(types);
    }

    /// Current text MIME set, in insertion order.
    pub fn text_mime_types(&self) -> Vec<String> {
        self.read_set().to_vec()
    }

    pub fn is_text_mime(&self, mime_type: &str) -> bool {
        self.read_set().contains(mime_type)
    }

    /// Encode a payload into framed bytes.
    pub fn encode(&self, payload: &Payload) -> Result<Bytes> {
        let (body, mime_type) = match &payload.message {
            Message::Text(text) => match payload.mime_type.as_deref() {
                Some(mime_type) if self.is_text_mime(mime_type) => {
                    (Bytes::copy_from_slice(text.as_bytes()), mime_type.to_string())
                }
                other => {
                    tracing::warn!(
                        mime_type = other.unwrap_or("none"),
                        "refusing to encode text message without a text mime type"
                    );
                    return Err(CodecError::NotTextMime {
                        mime_type: other.map(str::to_string),
                    });
                }
            },
            Message::Binary(bytes) => (
                bytes.clone(),
                payload
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| APPLICATION_OCTET_STREAM.to_string()),
            ),
        };

        let metadata = PayloadMetadata {
            mime_type,
            headers: payload.headers.clone(),
        };
        self.framing.frame(&metadata, &body)
    }

    /// Decode framed bytes.
    pub fn decode(&self, message: &Bytes) -> Result<DecodedPayload> {
        let (metadata, raw) = self.framing.unframe(message)?;

        let text = if self.is_text_mime(&metadata.mime_type) {
            match std::str::from_utf8(&raw) {
                Ok(text) => Some(text.to_string()),
                Err(_) => {
                    return Err(CodecError::InvalidUtf8 {
                        mime_type: metadata.mime_type,
                    })
                }
            }
        } else {
            None
        };

        Ok(DecodedPayload {
            mime_type: metadata.mime_type,
            raw,
            headers: metadata.headers,
            text,
        })
    }

    fn read_set(&self) -> RwLockReadGuard<'_, TextMimeTypes> {
        self.text_mime_types
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_set(&self) -> RwLockWriteGuard<'_, TextMimeTypes> {
        self.text_mime_types
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for PayloadCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PayloadCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PayloadCodec")
            .field("text_mime_types", &self.text_mime_types())
            .finish_non_exhaustive()
    }
}
