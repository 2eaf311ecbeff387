//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Clock Sync - estimate the offset between this host and a remote clock
#[derive(Parser, Debug)]
#[command(
    name = "clock-sync",
    author,
    version,
    about = "Estimate the offset between the local clock and a remote clock",
    long_about = "Takes timed round trips to a remote time source, rejects samples whose \n\
                  round-trip latency is an outlier, and reports the averaged offset \n\
                  (remote minus local) together with the estimated remote time."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CLOCK_SYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CLOCK_SYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Prometheus port requested by the selected command (None = disabled)
    pub fn metrics_port(&self) -> Option<u16> {
        match &self.command {
            Commands::Sync(args) if args.metrics_port != 0 => Some(args.metrics_port),
            _ => None,
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the offset to an RFC 868 time server (or any configured source)
    Sync(SyncArgs),

    /// Run the estimator against a simulated server with a known offset
    Simulate(SimulateArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Engine tuning shared by `sync` and `simulate`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TuningArgs {
    /// Number of successful samples to collect
    #[arg(long)]
    pub samples: Option<usize>,

    /// Delay between consecutive requests (milliseconds)
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Consecutive failures tolerated before the cycle gives up
    #[arg(long)]
    pub max_errors: Option<u32>,

    /// Per-request deadline in milliseconds
    #[arg(long)]
    pub request_timeout_ms: Option<u64>,
}

/// Arguments for the `sync` command
#[derive(Parser, Debug, Clone)]
pub struct SyncArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "CLOCK_SYNC_CONFIG", required_unless_present = "host")]
    pub config: Option<PathBuf>,

    /// RFC 868 server host (overrides the configuration file)
    #[arg(long, env = "CLOCK_SYNC_HOST")]
    pub host: Option<String>,

    /// RFC 868 server port
    #[arg(long, env = "CLOCK_SYNC_PORT")]
    pub port: Option<u16>,

    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Re-run a cycle every N seconds, keeping the previous estimate meanwhile (0 = run once)
    #[arg(long, default_value = "0", env = "CLOCK_SYNC_WATCH")]
    pub watch: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CLOCK_SYNC_METRICS_PORT")]
    pub metrics_port: u16,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// True remote-minus-local offset in seconds
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub offset: f64,

    /// Upper bound of the request-path latency (milliseconds)
    #[arg(long, default_value = "50")]
    pub max_send_ms: u64,

    /// Upper bound of the response-path latency (milliseconds)
    #[arg(long, default_value = "50")]
    pub max_receive_ms: u64,

    /// Use the bounds as exact latencies
    #[arg(long)]
    pub fixed_latency: bool,

    /// Probability that a request fails (0.0 - 1.0)
    #[arg(long, default_value = "0")]
    pub failure_rate: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub tuning: TuningArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "clock_sync.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
