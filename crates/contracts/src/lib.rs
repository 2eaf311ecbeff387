//! # Contracts
//!
//! Frozen interface contracts shared by every clock-sync crate.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Instants are seconds since the Unix epoch (`f64`)
//! - Offsets are `remote - local` in seconds, signed
//! - Latencies are seconds, non-negative

mod clock;
mod clock_sync_config;
mod error;
mod event;
mod sample;
mod settings;
mod time_provider;

pub use clock::LocalClock;
pub use clock_sync_config::*;
pub use error::*;
pub use event::*;
pub use sample::Sample;
pub use settings::*;
pub use time_provider::{provider_fn, FnTimeProvider, LocalRemoteTimeProvider, RemoteTimeProvider};
