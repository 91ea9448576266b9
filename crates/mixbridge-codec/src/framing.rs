use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Size of the metadata length prefix: one big-endian u64.
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Default maximum metadata block size: 64 KiB.
pub const DEFAULT_MAX_METADATA: usize = 64 * 1024;

/// MIME type and headers carried alongside a body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PayloadMetadata {
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
}

/// Wire framing that binds a body to its metadata.
///
/// The engine owns the actual format; implementations must be pure.
pub trait PayloadFraming: Send + Sync {
    /// Frame `body` with `metadata`.
    fn frame(&self, metadata: &PayloadMetadata, body: &[u8]) -> Result<Bytes>;

    /// Split a framed message into metadata and body.
    fn unframe(&self, message: &Bytes) -> Result<(PayloadMetadata, Bytes)>;
}

/// Length-prefixed JSON metadata followed by the body.
///
/// Wire format:
/// ```text
/// ┌────────────────┬──────────────────────────────┬─────────────┐
/// │ Length (8B BE) │ Metadata (JSON, Length bytes)│ Body        │
/// │                │ {"mimeType":..,"headers":..} │ (remainder) │
/// └────────────────┴──────────────────────────────┴─────────────┘
/// ```
#[derive(Debug, Clone)]
pub struct JsonMetadataFraming {
    max_metadata: usize,
}

impl JsonMetadataFraming {
    pub fn new() -> Self {
        Self::with_max_metadata(DEFAULT_MAX_METADATA)
    }

    pub fn with_max_metadata(max_metadata: usize) -> Self {
        Self { max_metadata }
    }
}

impl Default for JsonMetadataFraming {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadFraming for JsonMetadataFraming {
    fn frame(&self, metadata: &PayloadMetadata, body: &[u8]) -> Result<Bytes> {
        let encoded = serde_json::to_vec(metadata)?;
        if encoded.len() > self.max_metadata {
            return Err(CodecError::MetadataTooLarge {
                size: encoded.len(),
                max: self.max_metadata,
            });
        }

        let mut dst = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + encoded.len() + body.len());
        dst.put_u64(encoded.len() as u64);
        dst.put_slice(&encoded);
        dst.put_slice(body);
        Ok(dst.freeze())
    }

    fn unframe(&self, message: &Bytes) -> Result<(PayloadMetadata, Bytes)> {
        if message.len() < LENGTH_PREFIX_SIZE {
            return Err(CodecError::Truncated {
                len: message.len(),
                needed: LENGTH_PREFIX_SIZE,
            });
        }

        let mut src = message.clone();
        let declared = src.get_u64();
        let metadata_len = usize::try_from(declared).unwrap_or(usize::MAX);
        if metadata_len > self.max_metadata {
            return Err(CodecError::MetadataTooLarge {
                size: metadata_len,
                max: self.max_metadata,
            });
        }
        if src.len() < metadata_len {
            return Err(CodecError::Truncated {
                len: message.len(),
                needed: LENGTH_PREFIX_SIZE + metadata_len,
            });
        }

        let metadata_bytes = src.split_to(metadata_len);
        let metadata: PayloadMetadata = serde_json::from_slice(&metadata_bytes)?;
        Ok((metadata, src))
    }
}
