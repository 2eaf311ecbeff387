//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ClockSyncSettings, SourceConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    source: String,
    target: String,
    max_samples: usize,
    interval_ms: u64,
    max_consecutive_errors: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_timeout_ms: Option<u64>,
    event_name: String,
}

impl ConfigSummary {
    fn from_settings(settings: &ClockSyncSettings) -> Self {
        let target = match &settings.source {
            SourceConfig::Rfc868(rfc868) => format!("{}:{}", rfc868.host, rfc868.port),
            SourceConfig::Simulated(sim) => format!("true offset {:+} s", sim.true_offset_s),
        };
        Self {
            version: format!("{:?}", settings.version),
            source: settings.source.kind().to_string(),
            target,
            max_samples: settings.clock_sync.max_samples,
            interval_ms: settings.clock_sync.interval_ms,
            max_consecutive_errors: settings.clock_sync.max_consecutive_errors,
            request_timeout_ms: settings.clock_sync.request_timeout_ms,
            event_name: settings.clock_sync.event_name.clone(),
        }
    }
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(settings) => {
            let warnings = collect_warnings(&settings);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary::from_settings(&settings)),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(settings: &ClockSyncSettings) -> Vec<String> {
    let mut warnings = Vec::new();
    let engine = &settings.clock_sync;

    if engine.max_samples == 1 {
        warnings.push("max_samples is 1 - no latency outlier rejection will happen".to_string());
    }

    if engine.max_consecutive_errors == 0 {
        warnings.push("max_consecutive_errors is 0 - the first failure ends the cycle".to_string());
    }

    if let SourceConfig::Rfc868(_) = settings.source {
        if engine.request_timeout_ms.is_none() {
            warnings.push(
                "request_timeout_ms is unset - a stalled server can hold the cycle open"
                    .to_string(),
            );
        }
        if engine.interval_ms == 0 {
            warnings.push("interval_ms is 0 - requests will be sent back-to-back".to_string());
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Source: {} ({})", summary.source, summary.target);
            println!("  Samples: {}", summary.max_samples);
            println!("  Interval: {} ms", summary.interval_ms);
            println!("  Error budget: {}", summary.max_consecutive_errors);
            if let Some(timeout) = summary.request_timeout_ms {
                println!("  Request timeout: {} ms", timeout);
            }
            println!("  Event name: {}", summary.event_name);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
