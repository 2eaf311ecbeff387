//! `sync` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{ClockSyncSettings, Rfc868SourceConfig, SourceConfig};
use observability::SyncMetricsAggregator;
use std::time::Duration;
use sync_engine::{ClockSync, MonotonicClock, RemoteTimeProvider};
use time_source::TimeSource;
use tracing::{info, warn};

use super::{apply_tuning, run_cycle, shutdown_signal, CycleReport};
use crate::cli::SyncArgs;
use crate::error::CliError;

/// Execute the `sync` command
pub async fn run_sync(args: &SyncArgs) -> Result<()> {
    let settings = resolve_settings(args)?;

    info!(
        source = settings.source.kind(),
        max_samples = settings.clock_sync.max_samples,
        interval_ms = settings.clock_sync.interval_ms,
        max_consecutive_errors = settings.clock_sync.max_consecutive_errors,
        "Configuration loaded"
    );

    let clock = MonotonicClock::new();
    let source = TimeSource::from_config(&settings.source, clock);
    let sync = ClockSync::with_clock(settings.clock_sync, source, clock)
        .context("Failed to create clock sync engine")?;

    let mut aggregator = SyncMetricsAggregator::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let update = tokio::select! {
            update = run_cycle(&sync, &mut aggregator) => update,
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping sync...");
                sync.stop();
                break;
            }
        };
        let Some(update) = update else {
            break;
        };

        aggregator.record_samples(&sync.samples());
        let report = CycleReport::collect(&sync, &update);
        if args.json {
            println!(
                "{}",
                serde_json::to_string(&report).context("Failed to serialize report")?
            );
        } else {
            report.print();
        }

        if args.watch == 0 {
            if update.offset.is_none() {
                return Err(CliError::no_estimate(sync.provider().name()).into());
            }
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.watch)) => {}
            _ = &mut shutdown => {
                warn!("Received shutdown signal, stopping sync...");
                break;
            }
        }
        // Keep serving the previous estimate while the next cycle samples.
        sync.reset(false);
    }

    if args.watch > 0 && !args.json {
        println!("\n{}", aggregator.summary());
    }

    info!("Clock Sync finished");
    Ok(())
}

/// Load the configuration file (if any) and apply command-line overrides
fn resolve_settings(args: &SyncArgs) -> Result<ClockSyncSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()).into());
            }
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => {
            let host = args.host.clone().ok_or(CliError::MissingSource)?;
            ClockSyncSettings::new(SourceConfig::Rfc868(Rfc868SourceConfig::new(host)))
        }
    };

    match &mut settings.source {
        SourceConfig::Rfc868(rfc868) => {
            if let Some(ref host) = args.host {
                info!(host = %host, "Overriding time server host from CLI");
                rfc868.host = host.clone();
            }
            if let Some(port) = args.port {
                info!(port = port, "Overriding time server port from CLI");
                rfc868.port = port;
            }
        }
        SourceConfig::Simulated(_) => {
            if args.host.is_some() || args.port.is_some() {
                warn!("--host/--port ignored: configured source is simulated");
            }
        }
    }

    apply_tuning(&args.tuning, &mut settings.clock_sync);
    ConfigLoader::validate(&settings).context("Invalid settings")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TuningArgs;
    use std::io::Write;
    use std::path::PathBuf;

    fn args(config: Option<PathBuf>, host: Option<&str>) -> SyncArgs {
        SyncArgs {
            config,
            host: host.map(str::to_string),
            port: None,
            tuning: TuningArgs::default(),
            watch: 0,
            metrics_port: 0,
            json: false,
        }
    }

    #[test]
    fn test_host_only_builds_rfc868_source() {
        let mut args = args(None, Some("time.example.net"));
        args.port = Some(3737);
        args.tuning.samples = Some(8);

        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.clock_sync.max_samples, 8);
        match settings.source {
            SourceConfig::Rfc868(rfc868) => {
                assert_eq!(rfc868.host, "time.example.net");
                assert_eq!(rfc868.port, 3737);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_missing_source() {
        let err = resolve_settings(&args(None, None)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::MissingSource)
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err =
            resolve_settings(&args(Some(PathBuf::from("/nonexistent/clock.toml")), None))
                .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(
            br#"
[clock_sync]
max_samples = 4

[source]
kind = "rfc868"
host = "from-file"
"#,
        )
        .unwrap();

        let mut args = args(Some(file.path().to_path_buf()), Some("from-cli"));
        args.tuning.interval_ms = Some(0);

        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.clock_sync.max_samples, 4);
        assert_eq!(settings.clock_sync.interval_ms, 0);
        match settings.source {
            SourceConfig::Rfc868(rfc868) => assert_eq!(rfc868.host, "from-cli"),
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut args = args(None, Some("localhost"));
        args.tuning.samples = Some(0);
        let err = resolve_settings(&args).unwrap_err();
        assert!(format!("{err:#}").contains("max_samples"));
    }
}
