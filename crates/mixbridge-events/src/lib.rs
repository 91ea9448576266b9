//! Typed multi-subscriber event bus for mixnet client events.
//!
//! Handlers register per [`EventKind`] and are invoked in registration order.
//! A panicking handler is contained and logged; its siblings still run.

pub mod error;
pub mod event;
pub mod registry;

pub use error::{EventError, Result};
pub use event::{BinaryMessage, Connected, Event, EventKind, Loaded, RawMessage, StringMessage};
pub use registry::{DispatchReport, Handler, Subscription, SubscriptionRegistry};
