//! Async client for a mixnet engine running in a background context.
//!
//! [`create_client`] boots the engine, waits for it to load and returns a
//! [`MixnetClient`]. Commands on the client are forwarded to the engine one
//! to one. Inbound traffic is decoded by the router and published on the
//! client's [`SubscriptionRegistry`](mixbridge_events::SubscriptionRegistry).

pub mod builder;
pub mod client;
pub mod error;
pub mod proxy;
pub mod router;

pub use builder::{create_client, create_loopback_client, ClientBuilder, ClientOptions};
pub use client::{MixnetClient, RawSendRequest, SendRequest};
pub use error::{ClientError, Result};
pub use proxy::{ChannelProxy, EngineProxy};
pub use router::{spawn_router, EventRouter};
