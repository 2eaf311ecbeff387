//! OffsetUpdated - Sync Engine output
//!
//! Event published every time the offset estimate is recomputed.

use serde::{Deserialize, Serialize};

/// Why an update was published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Early estimate from the first samples of a running cycle
    Partial,
    /// The cycle reached its terminal state
    Final,
}

/// "Offset updated" event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetUpdated {
    /// Identifier of the publishing engine (its configured event name)
    pub source: String,

    /// Current offset estimate; `None` until a sample has ever succeeded
    pub offset: Option<f64>,

    /// Samples held by the engine when the event was published
    pub sample_count: usize,

    /// Partial or final update
    pub kind: UpdateKind,
}

impl OffsetUpdated {
    /// Whether the publishing cycle has finished
    pub fn is_final(&self) -> bool {
        self.kind == UpdateKind::Final
    }
}

/// Point-in-time view of an engine (for diagnostics)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// A sampling cycle is in flight
    pub is_syncing: bool,

    /// Samples currently held
    pub sample_count: usize,

    /// Current offset estimate
    pub current_offset: Option<f64>,
}
