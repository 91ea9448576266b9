//! Client bridge to a mixnet engine running in a background context.
//!
//! # Crate Structure
//!
//! - [`codec`]: MIME-tagged payload encoding and framing
//! - [`events`]: typed multi-subscriber event bus
//! - [`worker`]: background context, engine trait and readiness handshake
//! - [`client`]: command façade and inbound routing (behind `client` feature)

/// Re-export codec types.
pub mod codec {
    pub use mixbridge_codec::*;
}

/// Re-export event types.
pub mod events {
    pub use mixbridge_events::*;
}

/// Re-export worker types.
pub mod worker {
    pub use mixbridge_worker::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use mixbridge_client::*;
}

#[cfg(feature = "client")]
pub use mixbridge_client::{create_client, ClientOptions, MixnetClient};
