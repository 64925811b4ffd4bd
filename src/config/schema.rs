//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the ban gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream that accepted requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Ban filter settings and the initial ban list.
    pub ban_filter: BanFilterConfig,

    /// Periodic eviction of lapsed bans.
    pub sweep: SweepConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Ban filter configuration.
///
/// `bans` maps a client address to an RFC3339 expiry timestamp. Timestamps
/// are not checked here; a malformed one is discovered (and dropped) the
/// first time its address shows up in traffic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BanFilterConfig {
    /// Identifier used in log fields.
    pub name: String,

    /// Enable ban checks. When false every request passes through.
    pub enabled: bool,

    /// Address -> RFC3339 expiry timestamp.
    pub bans: HashMap<String, String>,

    /// Reserved. Not consulted when filtering.
    pub whitelist: Vec<String>,

    /// Strip whitespace around each `X-Forwarded-For` entry before lookup.
    pub trim_candidates: bool,
}

impl Default for BanFilterConfig {
    fn default() -> Self {
        Self {
            name: "ban-gate".to_string(),
            enabled: false,
            bans: HashMap::new(),
            whitelist: Vec::new(),
            trim_candidates: false,
        }
    }
}

/// Background sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Run the periodic sweeper.
    pub enabled: bool,

    /// Seconds between sweeps.
    pub interval_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
