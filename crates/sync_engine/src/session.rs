//! Sampling session state machine.
//!
//! Pure, synchronous bookkeeping for one engine: sample set, current offset,
//! and the `Idle -> Sampling -> Done` phase of the current cycle. The async
//! driver in `engine.rs` performs the I/O and feeds results back in here, which
//! keeps every transition steppable from a plain unit test.

use contracts::{ClockSyncConfig, OffsetUpdated, Sample, SyncStatus, UpdateKind};

use crate::aggregator::robust_offset;

/// Identifies one sampling cycle; results from an older cycle are ignored
pub type CycleId = u64;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No cycle has run yet, or the last one was aborted
    Idle,
    /// Collecting samples
    Sampling {
        cycle: CycleId,
        errors_remaining: u32,
    },
    /// Last cycle reached its terminal state
    Done,
}

/// What the driver should do next
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Issue one timed request
    Fetch,
    /// Wait one interval then poll again; publish the event first if any
    Continue(Option<OffsetUpdated>),
    /// Terminal: publish the event and stop
    Finished(OffsetUpdated),
    /// The cycle is no longer current (aborted or superseded)
    Stopped,
}

/// Sample set, offset estimate and cycle phase of one engine
#[derive(Debug)]
pub struct SyncSession {
    max_samples: usize,
    max_consecutive_errors: u32,
    event_name: String,
    samples: Vec<Sample>,
    current_offset: Option<f64>,
    phase: Phase,
    next_cycle: CycleId,
}

impl SyncSession {
    /// Create an idle session
    pub fn new(config: &ClockSyncConfig) -> Self {
        Self {
            max_samples: config.max_samples,
            max_consecutive_errors: config.max_consecutive_errors,
            event_name: config.event_name.clone(),
            samples: Vec::with_capacity(config.max_samples),
            current_offset: None,
            phase: Phase::Idle,
            next_cycle: 0,
        }
    }

    /// Enter `Sampling` with a full error budget.
    ///
    /// Returns `None` (no-op) while a cycle is already in flight.
    pub fn begin(&mut self) -> Option<CycleId> {
        if self.is_syncing() {
            return None;
        }
        let cycle = self.next_cycle;
        self.next_cycle += 1;
        self.phase = Phase::Sampling {
            cycle,
            errors_remaining: self.max_consecutive_errors,
        };
        Some(cycle)
    }

    /// Decide whether `cycle` needs another sample or is finished
    pub fn poll(&mut self, cycle: CycleId) -> Step {
        let Some(errors_remaining) = self.errors_remaining(cycle) else {
            return Step::Stopped;
        };
        if errors_remaining == 0 || self.samples.len() >= self.max_samples {
            return self.finish();
        }
        Step::Fetch
    }

    /// Record a successful round trip for `cycle`
    pub fn record_success(&mut self, cycle: CycleId, sample: Sample) -> Step {
        if self.errors_remaining(cycle).is_none() {
            return Step::Stopped;
        }
        if self.samples.len() < self.max_samples {
            self.samples.push(sample);
        }
        if self.samples.len() >= self.max_samples {
            return self.finish();
        }
        if self.current_offset.is_none() {
            self.recompute();
            return Step::Continue(Some(self.event(UpdateKind::Partial)));
        }
        Step::Continue(None)
    }

    /// Record a provider failure for `cycle`; consumes one unit of budget
    pub fn record_failure(&mut self, cycle: CycleId) -> Step {
        match &mut self.phase {
            Phase::Sampling {
                cycle: current,
                errors_remaining,
            } if *current == cycle => {
                *errors_remaining = errors_remaining.saturating_sub(1);
                Step::Continue(None)
            }
            _ => Step::Stopped,
        }
    }

    /// Drop all samples; with `clear_offset` also forget the estimate.
    ///
    /// Does not affect an in-flight cycle.
    pub fn reset(&mut self, clear_offset: bool) {
        self.samples.clear();
        if clear_offset {
            self.current_offset = None;
        }
    }

    /// Abandon the in-flight cycle without publishing anything
    pub fn abort(&mut self) -> bool {
        let was_syncing = self.is_syncing();
        if was_syncing {
            self.phase = Phase::Idle;
        }
        was_syncing
    }

    /// A cycle is in flight
    pub fn is_syncing(&self) -> bool {
        matches!(self.phase, Phase::Sampling { .. })
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current estimate
    pub fn current_offset(&self) -> Option<f64> {
        self.current_offset
    }

    /// Collected samples in collection order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Diagnostics snapshot
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            is_syncing: self.is_syncing(),
            sample_count: self.samples.len(),
            current_offset: self.current_offset,
        }
    }

    /// Remaining failure budget of `cycle`, or `None` if it is not the current cycle
    pub fn errors_remaining(&self, cycle: CycleId) -> Option<u32> {
        match self.phase {
            Phase::Sampling {
                cycle: current,
                errors_remaining,
            } if current == cycle => Some(errors_remaining),
            _ => None,
        }
    }

    fn finish(&mut self) -> Step {
        self.phase = Phase::Done;
        self.recompute();
        Step::Finished(self.event(UpdateKind::Final))
    }

    fn recompute(&mut self) {
        if let Some(offset) = robust_offset(&self.samples) {
            self.current_offset = Some(offset);
        }
    }

    fn event(&self, kind: UpdateKind) -> OffsetUpdated {
        OffsetUpdated {
            source: self.event_name.clone(),
            offset: self.current_offset,
            sample_count: self.samples.len(),
            kind,
        }
    }
}
