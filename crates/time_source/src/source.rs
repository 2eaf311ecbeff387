//! TimeSource - provider selected by configuration

use contracts::{LocalClock, ProviderError, RemoteTimeProvider, SourceConfig};
use tracing::info;

use crate::rfc868::Rfc868TimeSource;
use crate::simulated::SimulatedTimeSource;

/// Any configured remote time source
pub enum TimeSource<C> {
    /// RFC 868 server over TCP
    Rfc868(Rfc868TimeSource),
    /// In-process simulation
    Simulated(SimulatedTimeSource<C>),
}

impl<C: LocalClock> TimeSource<C> {
    /// Build the provider described by `config`.
    ///
    /// `clock` is only used by the simulated source, which must share the
    /// engine's clock.
    pub fn from_config(config: &SourceConfig, clock: C) -> Self {
        let source = match config {
            SourceConfig::Rfc868(rfc868) => Self::Rfc868(Rfc868TimeSource::from_config(rfc868)),
            SourceConfig::Simulated(simulated) => {
                Self::Simulated(SimulatedTimeSource::new(simulated.clone(), clock))
            }
        };
        info!(kind = config.kind(), provider = source.name(), "time source created");
        source
    }
}

impl<C: LocalClock> RemoteTimeProvider for TimeSource<C> {
    fn name(&self) -> &str {
        match self {
            TimeSource::Rfc868(source) => source.name(),
            TimeSource::Simulated(source) => source.name(),
        }
    }

    async fn fetch(&self) -> Result<f64, ProviderError> {
        match self {
            TimeSource::Rfc868(source) => source.fetch().await,
            TimeSource::Simulated(source) => source.fetch().await,
        }
    }
}
