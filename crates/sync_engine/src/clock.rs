//! Local clock implementations.

use std::time::{SystemTime, UNIX_EPOCH};

use contracts::LocalClock;
use tokio::time::Instant;

/// Plain wall clock.
///
/// Follows every system clock adjustment, so a step during a request can
/// distort that sample's latency.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl LocalClock for SystemClock {
    fn now(&self) -> f64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(since) => since.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        }
    }
}

/// Wall clock read once, then advanced by a monotonic instant.
///
/// Latencies measured against it are never negative, and because it is driven
/// by `tokio::time::Instant` it follows paused/advanced time in tests.
/// Clones share the same anchor.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor_wall: f64,
    anchor: Instant,
}

impl MonotonicClock {
    /// Anchor at the current system time
    pub fn new() -> Self {
        Self::anchored_at(SystemClock.now())
    }

    /// Anchor at an explicit wall time (seconds since the Unix epoch)
    pub fn anchored_at(anchor_wall: f64) -> Self {
        Self {
            anchor_wall,
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalClock for MonotonicClock {
    fn now(&self) -> f64 {
        self.anchor_wall + self.anchor.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monotonic_clock_follows_tokio_time() {
        let clock = MonotonicClock::anchored_at(1000.0);
        let shared = clock;
        assert!((clock.now() - 1000.0).abs() < 1e-9);

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!((clock.now() - 1001.5).abs() < 1e-9);
        assert_eq!(clock.now(), shared.now());
    }
}
