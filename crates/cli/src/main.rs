//! # Clock Sync CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 对 RFC 868 时间服务器做 offset 估计 (单次或周期性)
//! - 离线模拟
//! - 配置验证

mod cli;
mod commands;
mod error;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_simulate, run_sync, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig::from_verbosity(cli.verbose, cli.quiet)
            .with_log_format(cli.log_format.into())
            .with_metrics_port(cli.metrics_port()),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "Clock Sync CLI starting");

    let result = match &cli.command {
        Commands::Sync(args) => run_sync(args).await,
        Commands::Simulate(args) => run_simulate(args).await,
        Commands::Validate(args) => run_validate(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
