//! Event kinds and their records.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::EventError;

/// Closed set of event tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Loaded,
    Connected,
    StringMessageReceived,
    BinaryMessageReceived,
    RawMessageReceived,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Loaded,
        EventKind::Connected,
        EventKind::StringMessageReceived,
        EventKind::BinaryMessageReceived,
        EventKind::RawMessageReceived,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Loaded => "Loaded",
            EventKind::Connected => "Connected",
            EventKind::StringMessageReceived => "StringMessageReceived",
            EventKind::BinaryMessageReceived => "BinaryMessageReceived",
            EventKind::RawMessageReceived => "RawMessageReceived",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    /// Accepts the tag name in any case, with or without the
    /// `MessageReceived` suffix (`string`, `binary`, `raw`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let short = lower.strip_suffix("messagereceived").unwrap_or(&lower);
        match short {
            "loaded" => Ok(EventKind::Loaded),
            "connected" => Ok(EventKind::Connected),
            "string" | "text" => Ok(EventKind::StringMessageReceived),
            "binary" => Ok(EventKind::BinaryMessageReceived),
            "raw" => Ok(EventKind::RawMessageReceived),
            _ => Err(EventError::UnknownKind(s.to_string())),
        }
    }
}

/// The background engine finished loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loaded;

/// The engine connected to the mixnet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connected {
    /// Our own mixnet address, when the engine reports one.
    pub address: Option<String>,
}

/// A message whose MIME type is in the text set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMessage {
    pub mime_type: String,
    /// UTF-8 decoded body.
    pub payload: String,
    /// Body bytes before UTF-8 decoding.
    pub payload_raw: Bytes,
    pub headers: Option<String>,
}

/// A message whose MIME type is not in the text set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMessage {
    pub mime_type: String,
    pub payload: Bytes,
    pub headers: Option<String>,
}

/// A message exactly as delivered by the engine, framing included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub payload: Bytes,
}

/// An event, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Loaded(Loaded),
    Connected(Connected),
    StringMessageReceived(StringMessage),
    BinaryMessageReceived(BinaryMessage),
    RawMessageReceived(RawMessage),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Loaded(_) => EventKind::Loaded,
            Event::Connected(_) => EventKind::Connected,
            Event::StringMessageReceived(_) => EventKind::StringMessageReceived,
            Event::BinaryMessageReceived(_) => EventKind::BinaryMessageReceived,
            Event::RawMessageReceived(_) => EventKind::RawMessageReceived,
        }
    }
}

impl From<Loaded> for Event {
    fn from(value: Loaded) -> Self {
        Event::Loaded(value)
    }
}

impl From<Connected> for Event {
    fn from(value: Connected) -> Self {
        Event::Connected(value)
    }
}

impl From<StringMessage> for Event {
    fn from(value: StringMessage) -> Self {
        Event::StringMessageReceived(value)
    }
}

impl From<BinaryMessage> for Event {
    fn from(value: BinaryMessage) -> Self {
        Event::BinaryMessageReceived(value)
    }
}

impl From<RawMessage> for Event {
    fn from(value: RawMessage) -> Self {
        Event::RawMessageReceived(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let event: Event = RawMessage {
            payload: Bytes::from_static(b"x"),
        }
        .into();
        assert_eq!(event.kind(), EventKind::RawMessageReceived);
        assert_eq!(Event::from(Loaded).kind(), EventKind::Loaded);
    }

    #[test]
    fn parse_kind_names() {
        assert_eq!(
            "StringMessageReceived".parse::<EventKind>().unwrap(),
            EventKind::StringMessageReceived
        );
        assert_eq!("raw".parse::<EventKind>().unwrap(), EventKind::RawMessageReceived);
        assert_eq!(" Connected ".parse::<EventKind>().unwrap(), EventKind::Connected);
        assert!(matches!(
            "bogus".parse::<EventKind>(),
            Err(EventError::UnknownKind(_))
        ));
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for kind in EventKind::ALL {
            assert_eq!(kind.to_string().parse::<EventKind>().unwrap(), kind);
        }
    }
}
