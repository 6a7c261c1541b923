//! The acquisition scheduler.
//!
//! Owns the [`AcquisitionState`] and is the only component that mutates it.
//! Cycles never overlap: a tick that arrives while a cycle is in flight is
//! dropped and counted. Every cycle carries the generation it started under;
//! a result that comes back after the generation moved on (because the
//! scheduler was shut down) is discarded instead of applied.
//!
//! ```text
//!        tick              read() settles
//!  Idle ───────▶ Fetching ───────────────▶ apply ──▶ Idle
//!                   │
//!                   └── tick while Fetching: Skipped
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use salain_types::{AcquisitionResult, FallbackReason, Provenance, SensorReading};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::data::{Assessment, Classifier, History, SystemStatus};
use crate::source::AcquisitionSource;

/// Whether a cycle is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
}

/// The reading currently on display, with everything derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentReading {
    pub reading: SensorReading,
    pub provenance: Provenance,
    /// Why the reading is synthetic, `None` for store readings.
    pub fallback: Option<FallbackReason>,
    pub assessment: Assessment,
    pub acquired_at: DateTime<Utc>,
}

impl CurrentReading {
    fn new(result: &AcquisitionResult, assessment: Assessment, acquired_at: DateTime<Utc>) -> Self {
        Self {
            reading: *result.reading(),
            provenance: result.provenance(),
            fallback: result.fallback_reason(),
            assessment,
            acquired_at,
        }
    }
}

/// Everything the scheduler knows. Read through [`Scheduler::state`].
#[derive(Debug, Clone)]
pub struct AcquisitionState {
    current: CurrentReading,
    history: History,
    phase: Phase,
    generation: u64,
    cycles: u64,
    skipped_ticks: u64,
    discarded: u64,
    running: bool,
}

impl AcquisitionState {
    pub fn current(&self) -> &CurrentReading {
        &self.current
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bumped when a cycle starts and when the scheduler shuts down.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cycles applied since bootstrap.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Ticks dropped because a cycle was still in flight.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    /// Results dropped because their generation was stale.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn system_status(&self) -> SystemStatus {
        SystemStatus::derive(self.current.fallback, self.running)
    }
}

/// What happened to one call to [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A reading was applied.
    Applied(Provenance),
    /// A cycle was already in flight.
    Skipped,
    /// The result arrived after shutdown and was dropped.
    Discarded,
    /// The scheduler is shut down.
    Stopped,
}

#[derive(Debug)]
struct Inner {
    state: RwLock<AcquisitionState>,
    source: tokio::sync::Mutex<Box<dyn AcquisitionSource>>,
    classifier: Mutex<Classifier>,
    description: String,
    interval: Duration,
    updates: watch::Sender<u64>,
}

/// Returns the phase to `Idle` when a cycle ends, including when the cycle
/// future is dropped mid-flight.
struct FetchGuard<'a> {
    state: &'a RwLock<AcquisitionState>,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.state.write().phase = Phase::Idle;
    }
}

/// Drives acquisition cycles. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Seed history and take the first reading.
    ///
    /// History is filled to `capacity` from the source's seed; the first
    /// reading becomes current without being appended, so the newest seeded
    /// value is not duplicated.
    pub async fn bootstrap(
        mut source: Box<dyn AcquisitionSource>,
        capacity: usize,
        interval: Duration,
        mut classifier: Classifier,
    ) -> Self {
        let seed = source.history_seed(capacity).await;
        let mut history = History::new(capacity);
        history.bootstrap(&seed.readings);

        let result = source.read().await;
        let assessment = classifier.assess(&result);
        let current = CurrentReading::new(&result, assessment, Utc::now());

        let description = source.description().to_string();
        info!(
            source = %description,
            seed = %seed.provenance,
            provenance = %current.provenance,
            capacity,
            "acquisition bootstrapped"
        );

        let state = AcquisitionState {
            current,
            history,
            phase: Phase::Idle,
            generation: 0,
            cycles: 0,
            skipped_ticks: 0,
            discarded: 0,
            running: true,
        };
        let (updates, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                source: tokio::sync::Mutex::new(source),
                classifier: Mutex::new(classifier),
                description,
                interval,
                updates,
            }),
        }
    }

    /// A copy of the current state.
    pub fn state(&self) -> AcquisitionState {
        self.inner.state.read().clone()
    }

    /// Description of the injected source.
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Receiver that observes the applied-cycle count.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Run one acquisition cycle unless one is already in flight.
    pub async fn tick(&self) -> TickOutcome {
        let generation = {
            let mut state = self.inner.state.write();
            if !state.running {
                return TickOutcome::Stopped;
            }
            if state.phase == Phase::Fetching {
                state.skipped_ticks += 1;
                debug!(skipped = state.skipped_ticks, "cycle in flight, tick skipped");
                return TickOutcome::Skipped;
            }
            state.phase = Phase::Fetching;
            state.generation += 1;
            state.generation
        };
        let _guard = FetchGuard {
            state: &self.inner.state,
        };

        let result = self.inner.source.lock().await.read().await;
        let assessment = self.inner.classifier.lock().assess(&result);

        let cycles = {
            let mut state = self.inner.state.write();
            if !state.running || state.generation != generation {
                state.discarded += 1;
                debug!(
                    cycle = generation,
                    current = state.generation,
                    "stale acquisition result discarded"
                );
                return TickOutcome::Discarded;
            }
            state.history.append(result.reading());
            state.current = CurrentReading::new(&result, assessment, Utc::now());
            state.cycles += 1;
            state.phase = Phase::Idle;
            state.cycles
        };

        trace!(
            cycle = generation,
            provenance = %result.provenance(),
            reason = ?result.fallback_reason(),
            "acquisition applied"
        );
        self.inner.updates.send_replace(cycles);
        TickOutcome::Applied(result.provenance())
    }

    fn note_skipped(&self) {
        let mut state = self.inner.state.write();
        state.skipped_ticks += 1;
        debug!(skipped = state.skipped_ticks, "cycle in flight, tick skipped");
    }

    /// Stop accepting cycles. Any in-flight result will be discarded.
    pub fn shutdown(&self) {
        let mut state = self.inner.state.write();
        if state.running {
            state.running = false;
            state.generation += 1;
            info!(cycles = state.cycles, "acquisition stopped");
        }
    }

    /// Start the timer loop on the current tokio runtime.
    ///
    /// Each tick runs its cycle as a separate task so a slow store never
    /// delays the timer. The first tick fires one interval after start,
    /// since bootstrap already took a reading.
    pub fn start(&self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let scheduler = self.clone();
        let interval = self.inner.interval;

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut timer = tokio::time::interval_at(start, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight: Option<JoinHandle<TickOutcome>> = None;

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                            scheduler.note_skipped();
                            continue;
                        }
                        let cycle = scheduler.clone();
                        in_flight = Some(tokio::spawn(async move { cycle.tick().await }));
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            if let Some(handle) = in_flight {
                handle.abort();
                let _ = handle.await;
            }
        });

        SchedulerHandle {
            scheduler: self.clone(),
            stop_tx,
            task,
        }
    }
}

/// Handle for the running timer loop.
///
/// Dropping it stops the timer; call [`SchedulerHandle::stop`] to also shut
/// the scheduler down and wait for the loop to exit.
#[derive(Debug)]
pub struct SchedulerHandle {
    scheduler: Scheduler,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Shut down, cancel the pending timer and abandon any in-flight cycle.
    pub async fn stop(self) {
        self.scheduler.shutdown();
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::{row, FakeStore, ScriptedSource};
    use crate::source::{RemoteReader, SyntheticGenerator, SyntheticSource};
    use salain_types::Metric;

    const INTERVAL: Duration = Duration::from_secs(5);

    async fn scripted(delays: Vec<Duration>) -> Scheduler {
        let source = ScriptedSource::new(delays, 300.0);
        Scheduler::bootstrap(Box::new(source), 20, INTERVAL, Classifier::seeded(1)).await
    }

    #[tokio::test(start_paused = true)]
    async fn test_bootstrap_fills_history() {
        let scheduler = scripted(vec![]).await;
        let state = scheduler.state();

        assert!(state.history().is_bootstrapped());
        assert_eq!(state.history().capacity(), 20);
        assert_eq!(state.current().reading.tds, 300.0);
        assert_eq!(state.current().provenance, Provenance::Remote);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(state.cycles(), 0);
        assert_eq!(state.system_status(), SystemStatus::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_applies_and_appends() {
        let scheduler = scripted(vec![]).await;

        assert_eq!(scheduler.tick().await, TickOutcome::Applied(Provenance::Remote));
        assert_eq!(scheduler.tick().await, TickOutcome::Applied(Provenance::Remote));

        let state = scheduler.state();
        assert_eq!(state.cycles(), 2);
        assert_eq!(state.current().reading.tds, 302.0);
        let tds = state.history().series(Metric::Tds).unwrap();
        assert_eq!(tds.len(), 20);
        assert_eq!(tds.latest(), Some(302.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_tick_is_skipped() {
        let scheduler =
            scripted(vec![Duration::ZERO, Duration::from_secs(7)]).await;

        let slow = scheduler.clone();
        let first = tokio::spawn(async move { slow.tick().await });
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(scheduler.state().phase(), Phase::Fetching);
        assert_eq!(scheduler.tick().await, TickOutcome::Skipped);

        assert_eq!(first.await.unwrap(), TickOutcome::Applied(Provenance::Remote));
        let state = scheduler.state();
        assert_eq!(state.skipped_ticks(), 1);
        assert_eq!(state.cycles(), 1);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_after_shutdown_is_discarded() {
        let scheduler =
            scripted(vec![Duration::ZERO, Duration::from_secs(2)]).await;

        let slow = scheduler.clone();
        let cycle = tokio::spawn(async move { slow.tick().await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.shutdown();

        assert_eq!(cycle.await.unwrap(), TickOutcome::Discarded);
        let state = scheduler.state();
        assert_eq!(state.discarded(), 1);
        assert_eq!(state.cycles(), 0);
        assert_eq!(state.current().reading.tds, 300.0);
        assert_eq!(state.system_status(), SystemStatus::Offline);
        assert_eq!(scheduler.tick().await, TickOutcome::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fallback_is_not_overwritten() {
        let late = SensorReading::new(7.0, 24.0, 400.0, 5.0, 60.0, 40.0);
        let store = FakeStore {
            delay: Duration::from_millis(4500),
            ..FakeStore::with_rows(vec![row(late)])
        };
        let reader = RemoteReader::new(
            Arc::new(store),
            Duration::from_millis(3000),
            SyntheticGenerator::seeded(Vec::new(), 8),
        );
        let scheduler =
            Scheduler::bootstrap(Box::new(reader), 20, INTERVAL, Classifier::seeded(2)).await;

        let outcome = scheduler.tick().await;
        assert_eq!(outcome, TickOutcome::Applied(Provenance::Synthetic));
        let applied = scheduler.state().current().clone();
        assert_eq!(applied.fallback, Some(FallbackReason::Timeout));

        // Long after the store would have answered
        tokio::time::sleep(Duration::from_secs(10)).await;
        let state = scheduler.state();
        assert_eq!(state.current(), &applied);
        assert_ne!(state.current().reading, late);
        assert_eq!(state.cycles(), 1);
        assert_eq!(state.system_status(), SystemStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_loop_drops_overlapping_ticks() {
        // Bootstrap read is instant, then two 7s cycles against a 5s timer
        let scheduler = scripted(vec![
            Duration::ZERO,
            Duration::from_secs(7),
            Duration::from_secs(7),
        ])
        .await;

        let handle = scheduler.start();
        tokio::time::sleep(Duration::from_secs(21)).await;
        handle.stop().await;

        // Cycles start at 5s and 15s; ticks at 10s and 20s are dropped.
        // The second cycle is abandoned at shutdown.
        let state = scheduler.state();
        assert_eq!(state.cycles(), 1);
        assert_eq!(state.skipped_ticks(), 2);
        assert_eq!(state.current().reading.tds, 301.0);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_length_is_stable_under_timer() {
        let source = SyntheticSource::new(SyntheticGenerator::seeded(Vec::new(), 5));
        let scheduler =
            Scheduler::bootstrap(Box::new(source), 30, INTERVAL, Classifier::seeded(3)).await;
        let mut updates = scheduler.subscribe();

        let handle = scheduler.start();
        for _ in 0..10 {
            updates.changed().await.unwrap();
            let state = scheduler.state();
            for metric in Metric::ALL {
                assert_eq!(state.history().series(metric).unwrap().len(), 30);
            }
            assert!(state.current().reading.is_in_domain());
            assert_eq!(state.system_status(), SystemStatus::Online);
        }
        handle.stop().await;
        assert_eq!(scheduler.state().cycles(), 10);
    }
}
