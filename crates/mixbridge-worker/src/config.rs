use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Start configuration handed to the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Local identifier for this client instance.
    pub client_id: String,
    /// Base URL of the API used to fetch the network topology.
    pub nym_api_url: String,
    /// Gateway to register with instead of a random one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_gateway_identity_key: Option<String>,
    /// Explicit gateway listener address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_listener: Option<String>,
    /// Engine tuning, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugOptions>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, nym_api_url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            nym_api_url: nym_api_url.into(),
            ..Self::default()
        }
    }

    pub fn with_preferred_gateway(mut self, identity_key: impl Into<String>) -> Self {
        self.preferred_gateway_identity_key = Some(identity_key.into());
        self
    }

    pub fn with_gateway_listener(mut self, listener: impl Into<String>) -> Self {
        self.gateway_listener = Some(listener.into());
        self
    }

    pub fn with_debug(mut self, debug: DebugOptions) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Parse a JSON document in the camelCase layout.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check the fields every engine depends on.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.client_id.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "client_id must not be empty".to_string(),
            ));
        }
        if self.nym_api_url.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "nym_api_url must not be empty".to_string(),
            ));
        }
        if let Some(key) = &self.preferred_gateway_identity_key {
            if key.trim().is_empty() {
                return Err(EngineError::InvalidConfig(
                    "preferred_gateway_identity_key must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Engine tuning sections. Unset fields keep the engine's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DebugOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<TrafficOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_traffic: Option<CoverTrafficOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledgements: Option<AcknowledgementOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologyOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_surbs: Option<ReplySurbOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_connection: Option<GatewayConnectionOptions>,
}

/// Real traffic stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrafficOptions {
    /// Mean Poisson delay applied to a packet at each mix node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_packet_delay_ms: Option<u64>,
    /// Mean Poisson delay between two real messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_sending_average_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_main_poisson_packet_distribution: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_extended_packet_size: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_outfox: Option<bool>,
}

/// Loop cover traffic stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoverTrafficOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_cover_traffic_average_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_traffic_primary_size_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_loop_cover_traffic_stream: Option<bool>,
}

/// Acknowledgement delays and retransmission waits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgementOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_ack_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_wait_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_wait_addition_ms: Option<u64>,
}

/// Topology refresh.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopologyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_refresh_rate_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology_resolution_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_refreshing: Option<bool>,
}

/// Reply SURB storage and request sizing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplySurbOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_reply_surb_storage_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_reply_surb_storage_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_reply_surb_request_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_reply_surb_request_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_allowed_reply_surb_request_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_reply_surb_rerequest_waiting_period_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_reply_surb_drop_waiting_period_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_reply_surb_age_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_reply_key_age_ms: Option<u64>,
}

/// Gateway connection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConnectionOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_response_timeout_ms: Option<u64>,
}

/// Controls how the worker context is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Name of the worker thread.
    pub thread_name: String,
    /// Pending commands buffered before callers wait for room.
    pub command_queue_capacity: usize,
    /// Give up on the `Loaded` handshake after this long. `None` waits
    /// indefinitely.
    pub ready_timeout: Option<Duration>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            thread_name: "mixbridge-worker".to_string(),
            command_queue_capacity: 64,
            ready_timeout: None,
        }
    }
}

impl BootstrapConfig {
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}
