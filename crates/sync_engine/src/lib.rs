//! # Sync Engine
//!
//! Best-effort estimation of the offset between the local clock and a remote
//! authoritative clock, over any request/response channel.
//!
//! Responsibilities:
//! - Timed round trips to a `RemoteTimeProvider`, spaced by a fixed interval
//! - Bounded retry budget for provider failures
//! - Early (partial) estimate after the first sample, final estimate once the
//!   target sample count or the error budget is reached
//! - Median + standard deviation outlier rejection on round-trip latency
//! - `OffsetUpdated` events on a broadcast channel owned by the engine
//!
//! ## Usage Example
//!
//! ```ignore
//! use sync_engine::{ClockSync, ClockSyncConfig};
//!
//! let sync = ClockSync::new(ClockSyncConfig::default(), provider)?;
//! let mut updates = sync.subscribe();
//!
//! sync.start();
//! while let Ok(update) = updates.recv().await {
//!     println!("offset now {:?}", update.offset);
//!     if update.is_final() {
//!         break;
//!     }
//! }
//! let server_now = sync.current_time();
//! ```

mod aggregator;
mod clock;
mod engine;
mod session;

pub use aggregator::{robust_offset, LatencyStats};
pub use clock::{MonotonicClock, SystemClock};
pub use engine::ClockSync;
pub use session::{CycleId, Phase, Step, SyncSession};

// Re-export contracts types
pub use contracts::{
    ClockSyncConfig, LocalClock, OffsetUpdated, RemoteTimeProvider, Sample, SyncStatus,
    UpdateKind,
};
