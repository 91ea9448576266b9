//! MIME-tagged payload encoding for mixnet messages.
//!
//! Every outbound message is a [`Payload`] carrying a text or binary body, an
//! optional MIME type and optional headers. Encoding turns it into bytes:
//! - Text bodies are accepted only for MIME types in the text set
//! - The body is framed together with its MIME type and headers
//!
//! Decoding reverses the framing and, for text MIME types, yields a string.

pub mod codec;
pub mod error;
pub mod framing;
pub mod mime;
pub mod payload;

pub use codec::PayloadCodec;
pub use error::{CodecError, Result};
pub use framing::{
    JsonMetadataFraming, PayloadFraming, PayloadMetadata, DEFAULT_MAX_METADATA, LENGTH_PREFIX_SIZE,
};
pub use mime::{TextMimeTypes, APPLICATION_JSON, APPLICATION_OCTET_STREAM, TEXT_PLAIN};
pub use payload::{DecodedPayload, Message, Payload};
