//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Neither a configuration file nor a host was given
    #[error("No time source: pass --config or --host")]
    MissingSource,

    /// The cycle ended without a single successful sample
    #[error("No offset estimate from '{provider}': every request failed")]
    NoEstimate { provider: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn no_estimate(provider: impl Into<String>) -> Self {
        Self::NoEstimate {
            provider: provider.into(),
        }
    }
}
