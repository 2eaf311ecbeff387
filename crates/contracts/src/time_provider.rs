//! RemoteTimeProvider trait - remote clock abstraction
//!
//! Decouples the sampling cycle from whatever transport reaches the remote party.

use std::future::Future;

use crate::ProviderError;

/// Asynchronous capability returning the remote party's current time.
///
/// Each call must eventually resolve exactly once; latency is unconstrained.
///
/// # Example
///
/// ```ignore
/// struct Fixed;
///
/// impl RemoteTimeProvider for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     async fn fetch(&self) -> Result<f64, ProviderError> {
///         Ok(1_700_000_000.0)
///     }
/// }
/// ```
#[trait_variant::make(RemoteTimeProvider: Send)]
pub trait LocalRemoteTimeProvider {
    /// Provider name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Ask the remote party for its current time (seconds since the Unix epoch)
    ///
    /// # Errors
    /// Any failure; the caller treats every error the same way
    async fn fetch(&self) -> Result<f64, ProviderError>;
}

/// Provider backed by a closure returning a future
pub struct FnTimeProvider<F> {
    name: String,
    fetch: F,
}

/// Wrap a closure as a [`RemoteTimeProvider`]
pub fn provider_fn<F, Fut>(name: impl Into<String>, fetch: F) -> FnTimeProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<f64, ProviderError>> + Send,
{
    FnTimeProvider {
        name: name.into(),
        fetch,
    }
}

impl<F, Fut> RemoteTimeProvider for FnTimeProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<f64, ProviderError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> impl Future<Output = Result<f64, ProviderError>> + Send {
        (self.fetch)()
    }
}
