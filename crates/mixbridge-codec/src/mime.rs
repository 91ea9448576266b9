//! The set of MIME types treated as text.
//!
//! Membership decides whether a body is UTF-8 encoded on send and whether an
//! inbound body is surfaced as a string or as bytes.

/// Plain text.
pub const TEXT_PLAIN: &str = "text/plain";

/// JSON documents.
pub const APPLICATION_JSON: &str = "application/json";

/// Fallback MIME type for binary bodies sent without one.
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Ordered, duplicate-free set of text MIME types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMimeTypes {
    types: Vec<String>,
}

impl TextMimeTypes {
    /// Build a set from a list; duplicates and blank entries are dropped.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self { types: Vec::new() };
        set.replace(types);
        set
    }

    /// Replace the whole set.
    pub fn replace<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.clear();
        for mime_type in types {
            let mime_type = normalize(mime_type.into());
            if mime_type.is_empty() || self.types.contains(&mime_type) {
                continue;
            }
            self.types.push(mime_type);
        }
    }

    /// Returns true if `mime_type` is treated as text.
    pub fn contains(&self, mime_type: &str) -> bool {
        let mime_type = normalize(mime_type.to_string());
        self.types.iter().any(|known| *known == mime_type)
    }

    /// Members in insertion order.
    pub fn to_vec(&self) -> Vec<String> {
        self.types.clone()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TextMimeTypes {
    fn default() -> Self {
        Self::new([TEXT_PLAIN, APPLICATION_JSON])
    }
}

// MIME types compare case-insensitively; parameters such as `; charset=utf-8`
// are not part of the type.
fn normalize(mime_type: String) -> String {
    let essence = mime_type.split(';').next().unwrap_or_default();
    essence.trim().to_ascii_lowercase()
}
