//! Clock sync configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ContractError;

/// Identifier carried by every `OffsetUpdated` event unless overridden
pub const DEFAULT_EVENT_NAME: &str = "clock_sync.did_update";

/// Clock sync configuration
///
/// Read-only for the lifetime of an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSyncConfig {
    /// Target sample count for a final estimate
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    /// Delay between two consecutive requests (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Provider failures tolerated per cycle before giving up early
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,

    /// Identifier carried by published events
    #[serde(default = "default_event_name")]
    pub event_name: String,

    /// Per-request deadline (milliseconds); a request exceeding it counts as a failure
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_max_samples() -> usize {
    5
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_max_consecutive_errors() -> u32 {
    2
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

impl Default for ClockSyncConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            interval_ms: default_interval_ms(),
            max_consecutive_errors: default_max_consecutive_errors(),
            event_name: default_event_name(),
            request_timeout_ms: None,
        }
    }
}

impl ClockSyncConfig {
    /// Delay between two consecutive requests
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Per-request deadline, if any
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Reject configurations under which a sampling cycle could never collect data.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.max_samples == 0 {
            return Err(ContractError::config_validation(
                "clock_sync.max_samples",
                "max_samples must be > 0",
            ));
        }
        if self.event_name.trim().is_empty() {
            return Err(ContractError::config_validation(
                "clock_sync.event_name",
                "event_name cannot be empty",
            ));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ContractError::config_validation(
                "clock_sync.request_timeout_ms",
                "request_timeout_ms must be > 0 when set",
            ));
        }
        Ok(())
    }
}
