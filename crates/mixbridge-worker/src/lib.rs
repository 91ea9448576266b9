//! Background execution context for a mixnet engine.
//!
//! The engine runs on its own thread with its own runtime. The caller talks
//! to it only through channels:
//! - [`WorkerRequest`]s carry commands in and a oneshot reply out
//! - [`WorkerMessage`]s carry engine notifications back to the caller
//!
//! [`bootstrap`] launches the context and waits for the `Loaded` handshake
//! before handing out a [`WorkerHandle`].

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod loopback;
pub mod message;

pub use bootstrap::bootstrap;
pub use config::{
    AcknowledgementOptions, BootstrapConfig, ClientConfig, CoverTrafficOptions, DebugOptions,
    GatewayConnectionOptions, ReplySurbOptions, TopologyOptions, TrafficOptions,
};
pub use context::{spawn, WorkerHandle};
pub use engine::{validate_recipient, Engine, EngineEvents};
pub use error::{BootstrapError, EngineError, Result, WorkerError};
pub use loopback::LoopbackEngine;
pub use message::{CommandResponse, WorkerCommand, WorkerMessage, WorkerRequest};
