//! Async clock sync engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::{
    ClockSyncConfig, ContractError, LocalClock, OffsetUpdated, ProviderError, RemoteTimeProvider,
    Sample, SyncStatus,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::clock::MonotonicClock;
use crate::session::{CycleId, Step, SyncSession};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Estimates the offset between the local clock and a remote clock.
///
/// All state lives behind one mutex that is never held across an `.await`;
/// the sampling cycle runs as a single tokio task. Cloning yields another
/// handle to the same engine.
pub struct ClockSync<P, C = MonotonicClock> {
    inner: Arc<Inner<P, C>>,
}

struct Inner<P, C> {
    config: ClockSyncConfig,
    provider: P,
    clock: C,
    session: Mutex<SyncSession>,
    events: broadcast::Sender<OffsetUpdated>,
    cycle: Mutex<Option<JoinHandle<()>>>,
}

impl<P, C> Clone for ClockSync<P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> ClockSync<P, MonotonicClock>
where
    P: RemoteTimeProvider + Send + Sync + 'static,
{
    /// Create an engine measuring against a [`MonotonicClock`]
    ///
    /// # Errors
    /// Returns `ConfigValidation` when the config could never produce a sample
    pub fn new(config: ClockSyncConfig, provider: P) -> Result<Self, ContractError> {
        Self::with_clock(config, provider, MonotonicClock::new())
    }
}

impl<P, C> ClockSync<P, C>
where
    P: RemoteTimeProvider + Send + Sync + 'static,
    C: LocalClock,
{
    /// Create an engine measuring against `clock`
    ///
    /// # Errors
    /// Returns `ConfigValidation` when the config could never produce a sample
    pub fn with_clock(
        config: ClockSyncConfig,
        provider: P,
        clock: C,
    ) -> Result<Self, ContractError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let session = SyncSession::new(&config);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                provider,
                clock,
                session: Mutex::new(session),
                events,
                cycle: Mutex::new(None),
            }),
        })
    }

    /// Begin a sampling cycle in the background.
    ///
    /// Returns `false` without side effects if a cycle is already in flight
    /// or if there is no tokio runtime to run it on.
    pub fn start(&self) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(source = %self.inner.config.event_name, "no tokio runtime, sync not started");
            return false;
        };
        let Some(cycle) = self.inner.lock_session().begin() else {
            debug!(source = %self.inner.config.event_name, "sync already in flight, ignoring start");
            return false;
        };
        observability::record_cycle_started(&self.inner.config.event_name);

        let handle = runtime.spawn(run_cycle(Arc::clone(&self.inner), cycle));
        if let Some(previous) = self.inner.lock_cycle().replace(handle) {
            // Only a finished or aborted cycle can be replaced here.
            previous.abort();
        }
        true
    }

    /// Best estimate of the remote clock "now" (seconds since the Unix epoch).
    ///
    /// Local time plus the current offset, or plain local time before any
    /// sample has succeeded.
    pub fn current_time(&self) -> f64 {
        self.inner.clock.now() + self.current_offset().unwrap_or(0.0)
    }

    /// [`current_time`](Self::current_time) as a `SystemTime`
    pub fn server_time(&self) -> SystemTime {
        to_system_time(self.current_time())
    }

    /// Current offset estimate (`remote - local`, seconds)
    pub fn current_offset(&self) -> Option<f64> {
        self.inner.lock_session().current_offset()
    }

    /// Snapshot of the collected samples in collection order
    pub fn samples(&self) -> Vec<Sample> {
        self.inner.lock_session().samples().to_vec()
    }

    /// Diagnostics snapshot
    pub fn status(&self) -> SyncStatus {
        self.inner.lock_session().status()
    }

    /// A cycle is in flight
    pub fn is_syncing(&self) -> bool {
        self.inner.lock_session().is_syncing()
    }

    /// Receive every `OffsetUpdated` published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<OffsetUpdated> {
        self.inner.events.subscribe()
    }

    /// Drop collected samples; with `clear_offset` also forget the estimate.
    ///
    /// An in-flight cycle keeps running and keeps appending.
    pub fn reset(&self, clear_offset: bool) {
        self.inner.lock_session().reset(clear_offset);
        debug!(source = %self.inner.config.event_name, clear_offset, "samples cleared");
    }

    /// Abort the in-flight cycle, if any. Nothing is published.
    ///
    /// Samples collected so far are kept. Returns whether a cycle was running.
    pub fn stop(&self) -> bool {
        let was_syncing = self.inner.lock_session().abort();
        if let Some(handle) = self.inner.lock_cycle().take() {
            handle.abort();
        }
        if was_syncing {
            info!(source = %self.inner.config.event_name, "sync cycle stopped");
        }
        was_syncing
    }

    /// Wait until the current cycle (if any) has terminated
    pub async fn wait_idle(&self) {
        let handle = self.inner.lock_cycle().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(source = %self.inner.config.event_name, error = ?e, "sync task panicked");
                }
            }
        }
    }

    /// Engine configuration
    pub fn config(&self) -> &ClockSyncConfig {
        &self.inner.config
    }

    /// Remote time provider
    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// Local clock
    pub fn clock(&self) -> &C {
        &self.inner.clock
    }
}

impl<P, C> Inner<P, C>
where
    P: RemoteTimeProvider + Send + Sync + 'static,
    C: LocalClock,
{
    fn lock_session(&self) -> MutexGuard<'_, SyncSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_cycle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_remote(&self) -> Result<f64, ProviderError> {
        let remote = match self.config.request_timeout() {
            Some(deadline) => tokio::time::timeout(deadline, self.provider.fetch())
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::timeout(
                        self.provider.name(),
                        deadline.as_millis() as u64,
                    ))
                })?,
            None => self.provider.fetch().await?,
        };
        if !remote.is_finite() {
            return Err(ProviderError::protocol(
                self.provider.name(),
                format!("non-finite remote time {remote}"),
            ));
        }
        Ok(remote)
    }

    fn publish(&self, event: OffsetUpdated) {
        observability::record_offset_update(&event);
        info!(
            source = %event.source,
            offset = ?event.offset,
            sample_count = event.sample_count,
            kind = ?event.kind,
            "offset updated"
        );
        if self.events.send(event).is_err() {
            debug!(source = %self.config.event_name, "no subscribers for offset update");
        }
    }
}

/// Drive one sampling cycle to its terminal state
#[instrument(
    name = "clock_sync_cycle",
    skip(inner),
    fields(source = %inner.config.event_name, provider = inner.provider.name())
)]
async fn run_cycle<P, C>(inner: Arc<Inner<P, C>>, cycle: CycleId)
where
    P: RemoteTimeProvider + Send + Sync + 'static,
    C: LocalClock,
{
    let interval = inner.config.interval();

    loop {
        let step = inner.lock_session().poll(cycle);
        match step {
            Step::Fetch => {}
            Step::Finished(event) => {
                inner.publish(event);
                return;
            }
            Step::Continue(_) | Step::Stopped => return,
        }

        let start = inner.clock.now();
        let result = inner.fetch_remote().await;
        let end = inner.clock.now();

        let step = match result {
            Ok(remote) => {
                let sample = Sample::from_round_trip(remote, start, end);
                debug!(
                    offset = sample.offset,
                    latency = sample.round_trip_latency,
                    "sample collected"
                );
                observability::record_sample(&inner.config.event_name, &sample);
                inner.lock_session().record_success(cycle, sample)
            }
            Err(e) => {
                observability::record_provider_failure(
                    &inner.config.event_name,
                    inner.provider.name(),
                );
                let mut session = inner.lock_session();
                let step = session.record_failure(cycle);
                warn!(
                    error = %e,
                    errors_remaining = ?session.errors_remaining(cycle),
                    "remote time request failed"
                );
                step
            }
        };

        match step {
            Step::Finished(event) => {
                inner.publish(event);
                return;
            }
            Step::Continue(update) => {
                if let Some(event) = update {
                    inner.publish(event);
                }
            }
            Step::Fetch | Step::Stopped => return,
        }

        sleep_between_samples(interval).await;
    }
}

async fn sleep_between_samples(interval: Duration) {
    if interval.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(interval).await;
    }
}

fn to_system_time(seconds: f64) -> SystemTime {
    let magnitude = Duration::try_from_secs_f64(seconds.abs()).unwrap_or_default();
    if seconds >= 0.0 {
        UNIX_EPOCH + magnitude
    } else {
        UNIX_EPOCH - magnitude
    }
}
