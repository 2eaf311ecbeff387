//! Command implementations.

mod simulate;
mod sync;
mod validate;

pub use simulate::run_simulate;
pub use sync::run_sync;
pub use validate::run_validate;

use observability::{RunningStats, StatsSummary, SyncMetricsAggregator};
use serde::Serialize;
use sync_engine::{ClockSync, ClockSyncConfig, LocalClock, OffsetUpdated, RemoteTimeProvider};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::cli::TuningArgs;

/// Apply command-line tuning on top of the configured engine settings
fn apply_tuning(tuning: &TuningArgs, config: &mut ClockSyncConfig) {
    if let Some(samples) = tuning.samples {
        config.max_samples = samples;
    }
    if let Some(interval_ms) = tuning.interval_ms {
        config.interval_ms = interval_ms;
    }
    if let Some(max_errors) = tuning.max_errors {
        config.max_consecutive_errors = max_errors;
    }
    if let Some(timeout_ms) = tuning.request_timeout_ms {
        config.request_timeout_ms = Some(timeout_ms);
    }
}

/// Start one sampling cycle and wait for its final update.
///
/// Partial updates are logged and folded into `aggregator`.
async fn run_cycle<P, C>(
    sync: &ClockSync<P, C>,
    aggregator: &mut SyncMetricsAggregator,
) -> Option<OffsetUpdated>
where
    P: RemoteTimeProvider + Send + Sync + 'static,
    C: LocalClock,
{
    let mut updates = sync.subscribe();
    if !sync.start() {
        warn!("A sampling cycle is already running, waiting for it");
    }

    loop {
        match updates.recv().await {
            Ok(update) => {
                aggregator.update(&update);
                if update.is_final() {
                    return Some(update);
                }
                debug!(
                    offset = ?update.offset,
                    samples = update.sample_count,
                    "Early estimate"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Offset updates dropped by a slow receiver");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/// Outcome of one sampling cycle, for display
#[derive(Debug, Serialize)]
struct CycleReport {
    provider: String,
    offset_s: Option<f64>,
    sample_count: usize,
    local_time_unix: f64,
    remote_time_unix: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<LatencySummary>,
}

#[derive(Debug, Serialize)]
struct LatencySummary {
    min: f64,
    max: f64,
    mean: f64,
    std_dev: f64,
}

impl From<StatsSummary> for LatencySummary {
    fn from(stats: StatsSummary) -> Self {
        Self {
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            std_dev: stats.std_dev,
        }
    }
}

impl CycleReport {
    fn collect<P, C>(sync: &ClockSync<P, C>, update: &OffsetUpdated) -> Self
    where
        P: RemoteTimeProvider + Send + Sync + 'static,
        C: LocalClock,
    {
        let mut latency = RunningStats::default();
        for sample in sync.samples() {
            latency.push(sample.round_trip_latency * 1000.0);
        }

        let local_time_unix = sync.clock().now();
        Self {
            provider: sync.provider().name().to_string(),
            offset_s: update.offset,
            sample_count: update.sample_count,
            local_time_unix,
            remote_time_unix: local_time_unix + update.offset.unwrap_or(0.0),
            latency_ms: (latency.count() > 0).then(|| StatsSummary::from(&latency).into()),
        }
    }

    fn print(&self) {
        println!("Provider:     {}", self.provider);
        match self.offset_s {
            Some(offset) => println!("Offset:       {:+.6} s", offset),
            None => println!("Offset:       unknown"),
        }
        println!("Samples:      {}", self.sample_count);
        println!("Local time:   {:.6}", self.local_time_unix);
        println!("Remote time:  {:.6}", self.remote_time_unix);
        if let Some(ref latency) = self.latency_ms {
            println!(
                "Latency (ms): min={:.3}, max={:.3}, mean={:.3}, std={:.3}",
                latency.min, latency.max, latency.mean, latency.std_dev
            );
        }
    }
}

/// Resolve when Ctrl+C or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
