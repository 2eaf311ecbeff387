//! # Time Sources
//!
//! Concrete remote time providers.
//!
//! Responsibilities:
//! - RFC 868 Time Protocol client over TCP
//! - Simulated remote clock for tests and offline runs
//! - Build a provider from a `SourceConfig`
//!
//! ## Usage Example
//!
//! ```ignore
//! use time_source::TimeSource;
//!
//! let source = TimeSource::from_config(&settings.source, clock);
//! let sync = ClockSync::with_clock(settings.clock_sync, source, clock)?;
//! ```

mod rfc868;
mod simulated;
mod source;

// Re-exports
pub use contracts::{ProviderError, RemoteTimeProvider};
pub use rfc868::{rfc868_to_unix, unix_to_rfc868, Rfc868TimeSource, RFC868_EPOCH_OFFSET};
pub use simulated::SimulatedTimeSource;
pub use source::TimeSource;
