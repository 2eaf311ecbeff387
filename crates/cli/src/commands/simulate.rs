//! `simulate` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ClockSyncConfig, ClockSyncSettings, SimulatedSourceConfig, SourceConfig};
use observability::SyncMetricsAggregator;
use serde::Serialize;
use sync_engine::{ClockSync, MonotonicClock};
use time_source::SimulatedTimeSource;
use tracing::{info, warn};

use super::{apply_tuning, run_cycle, shutdown_signal, CycleReport};
use crate::cli::SimulateArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SimulationReport {
    #[serde(flatten)]
    cycle: CycleReport,
    true_offset_s: f64,
    requests: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_ms: Option<f64>,
}

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let (config, sim) = simulation_settings(args)?;

    info!(
        true_offset_s = sim.true_offset_s,
        max_send_ms = sim.max_send_ms,
        max_receive_ms = sim.max_receive_ms,
        failure_rate = sim.failure_rate,
        seed = ?sim.seed,
        "Starting simulation"
    );

    let clock = MonotonicClock::new();
    let source = SimulatedTimeSource::new(sim, clock);
    let sync = ClockSync::with_clock(config, source, clock)
        .context("Failed to create clock sync engine")?;

    let mut aggregator = SyncMetricsAggregator::new();
    let update = tokio::select! {
        update = run_cycle(&sync, &mut aggregator) => update,
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping simulation...");
            sync.stop();
            return Ok(());
        }
    };
    let Some(update) = update else {
        return Ok(());
    };

    let report = SimulationReport {
        cycle: CycleReport::collect(&sync, &update),
        true_offset_s: args.offset,
        requests: sync.provider().request_count(),
        error_ms: update.offset.map(|offset| (offset - args.offset) * 1000.0),
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        report.cycle.print();
        println!("True offset:  {:+.6} s", report.true_offset_s);
        println!("Requests:     {}", report.requests);
        if let Some(error_ms) = report.error_ms {
            println!("Error:        {:+.3} ms", error_ms);
        }
    }

    if update.offset.is_none() {
        return Err(CliError::no_estimate("simulated").into());
    }
    Ok(())
}

/// Engine tuning and simulated server derived from the arguments
fn simulation_settings(args: &SimulateArgs) -> Result<(ClockSyncConfig, SimulatedSourceConfig)> {
    let sim = SimulatedSourceConfig {
        true_offset_s: args.offset,
        max_send_ms: args.max_send_ms,
        max_receive_ms: args.max_receive_ms,
        fixed_latency: args.fixed_latency,
        failure_rate: args.failure_rate,
        seed: args.seed,
    };
    let mut settings = ClockSyncSettings::new(SourceConfig::Simulated(sim.clone()));
    apply_tuning(&args.tuning, &mut settings.clock_sync);
    ConfigLoader::validate(&settings).context("Invalid simulation parameters")?;
    Ok((settings.clock_sync, sim))
}
