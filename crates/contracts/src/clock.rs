//! LocalClock trait - the local side of every offset measurement

/// Source of local wall-clock time.
///
/// Offsets are computed against this clock, so the same instance must be used
/// for the request start, the request end and `current_time()`.
pub trait LocalClock: Send + Sync + 'static {
    /// Current local time, seconds since the Unix epoch
    fn now(&self) -> f64;
}
