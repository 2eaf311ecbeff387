//! Sample - one round-trip measurement

use serde::{Deserialize, Serialize};

/// Result of a single timed round trip to the remote clock.
///
/// Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Estimated `remote - local` for this round trip (seconds)
    pub offset: f64,

    /// Local wall-clock span of the request (seconds, >= 0)
    pub round_trip_latency: f64,
}

impl Sample {
    /// Build a sample from one completed round trip.
    ///
    /// Assumes symmetric latency: the remote instant is shifted forward by half
    /// the round trip before being compared with the local end instant.
    pub fn from_round_trip(remote_instant: f64, start_instant: f64, end_instant: f64) -> Self {
        let round_trip_latency = (end_instant - start_instant).max(0.0);
        let shifted_remote = remote_instant + round_trip_latency / 2.0;
        Self {
            offset: shifted_remote - end_instant,
            round_trip_latency,
        }
    }
}
