//! ClockSyncSettings - Config Loader output
//!
//! Complete file-level configuration: engine tuning plus the remote time source.

use serde::{Deserialize, Serialize};

use crate::ClockSyncConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSyncSettings {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Engine tuning
    #[serde(default)]
    pub clock_sync: ClockSyncConfig,

    /// Where remote time comes from
    pub source: SourceConfig,
}

impl ClockSyncSettings {
    /// Settings with default engine tuning for the given source
    pub fn new(source: SourceConfig) -> Self {
        Self {
            version: ConfigVersion::default(),
            clock_sync: ClockSyncConfig::default(),
            source,
        }
    }
}

/// Remote time source selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// RFC 868 Time Protocol server over TCP
    Rfc868(Rfc868SourceConfig),
    /// In-process simulated server
    Simulated(SimulatedSourceConfig),
}

impl SourceConfig {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Rfc868(_) => "rfc868",
            SourceConfig::Simulated(_) => "simulated",
        }
    }
}

/// RFC 868 source settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfc868SourceConfig {
    /// Server host
    pub host: String,

    /// Server port
    #[serde(default = "default_rfc868_port")]
    pub port: u16,

    /// Deadline for the TCP connect and again for the reply (milliseconds)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Rfc868SourceConfig {
    /// Default port and connect timeout for `host`
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_rfc868_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

fn default_rfc868_port() -> u16 {
    37
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

/// Simulated source settings
///
/// Each request waits a send latency, stamps `local + true_offset_s`, then
/// waits a receive latency before answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSourceConfig {
    /// True remote-minus-local offset (seconds)
    #[serde(default)]
    pub true_offset_s: f64,

    /// Upper bound of the request-path latency (milliseconds)
    #[serde(default = "default_max_latency_ms")]
    pub max_send_ms: u64,

    /// Upper bound of the response-path latency (milliseconds)
    #[serde(default = "default_max_latency_ms")]
    pub max_receive_ms: u64,

    /// Use the bounds as exact latencies instead of sampling uniformly below them
    #[serde(default)]
    pub fixed_latency: bool,

    /// Probability that a request fails (0.0 - 1.0)
    #[serde(default)]
    pub failure_rate: f64,

    /// RNG seed for reproducible traces
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_max_latency_ms() -> u64 {
    50
}

impl Default for SimulatedSourceConfig {
    fn default() -> Self {
        Self {
            true_offset_s: 0.0,
            max_send_ms: default_max_latency_ms(),
            max_receive_ms: default_max_latency_ms(),
            fixed_latency: false,
            failure_rate: 0.0,
            seed: None,
        }
    }
}
