//! Robust offset aggregation.
//!
//! Turns a noisy set of round-trip samples into one offset estimate by
//! discarding high-latency outliers: only samples whose latency is at most
//! one sample standard deviation above the median latency are averaged.

use contracts::Sample;

/// Latency distribution of a sample set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    /// Median round-trip latency
    pub median: f64,
    /// Arithmetic mean round-trip latency
    pub mean: f64,
    /// Sample standard deviation (denominator `n - 1`)
    pub std_dev: f64,
}

impl LatencyStats {
    /// Compute statistics over `samples`.
    ///
    /// Returns `None` for fewer than two samples (standard deviation undefined).
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        if samples.len() < 2 {
            return None;
        }
        let mut latencies: Vec<f64> = samples.iter().map(|s| s.round_trip_latency).collect();
        latencies.sort_by(f64::total_cmp);
        Some(Self::from_sorted_latencies(&latencies))
    }

    fn from_sorted_latencies(latencies: &[f64]) -> Self {
        let count = latencies.len();
        let median = if count % 2 == 0 {
            (latencies[count / 2 - 1] + latencies[count / 2]) / 2.0
        } else {
            latencies[count / 2]
        };
        let mean = latencies.iter().sum::<f64>() / count as f64;
        let squared_sum: f64 = latencies.iter().map(|l| (l - mean).powi(2)).sum();
        let std_dev = (squared_sum / (count - 1) as f64).sqrt();

        Self {
            median,
            mean,
            std_dev,
        }
    }

    /// Highest latency still considered accurate
    pub fn threshold(&self) -> f64 {
        self.median + self.std_dev
    }
}

/// Compute the robust offset of `samples`.
///
/// - one sample: its offset
/// - two or more: mean offset of the samples within `median + std_dev` latency
///
/// Returns `None` only for an empty set.
pub fn robust_offset(samples: &[Sample]) -> Option<f64> {
    match samples {
        [] => None,
        [only] => Some(only.offset),
        _ => Some(filtered_mean_offset(samples)),
    }
}

fn filtered_mean_offset(samples: &[Sample]) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.round_trip_latency.total_cmp(&b.round_trip_latency));

    let latencies: Vec<f64> = sorted.iter().map(|s| s.round_trip_latency).collect();
    let threshold = LatencyStats::from_sorted_latencies(&latencies).threshold();

    let (sum, accepted) = sorted
        .iter()
        .filter(|s| s.round_trip_latency <= threshold)
        .fold((0.0, 0usize), |(sum, n), s| (sum + s.offset, n + 1));

    if accepted == 0 {
        // Unreachable for finite latencies: the fastest sample is always <= median.
        return sorted[0].offset;
    }
    sum / accepted as f64
}
