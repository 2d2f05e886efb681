//! Phase-bucketed routine runner
//!
//! [`RoutineRunner`] owns every live routine, grouped into one bucket per
//! [`Phase`]. The host calls [`RoutineRunner::run_phase`] once per phase per
//! cycle, in [`Phase::ALL`] order; each call resumes that phase's bucket in
//! submission order, moving records whose next yield names another phase to
//! the tail of that phase's bucket.

pub mod driver;
mod queue;
pub mod task;


pub use driver::{DriverError, FrameDriver};
pub use task::{TaskId, TaskIdGenerator};

use parking_lot::{Mutex, ReentrantMutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::runtime::awaiter::RoutineAwaiter;
use crate::runtime::pause::PauseToken;
use crate::runtime::phase::Phase;
use crate::runtime::routine::{BoxCoroutine, Coroutine, Routine, Step};
use queue::PhaseQueues;
use task::{TaskRecord, Tick};

/// Runner counters.
#[derive(Debug, Default)]
pub struct RunnerStats {
    /// Routines submitted.
    pub submitted: AtomicU64,
    /// Routines whose chain was exhausted.
    pub completed: AtomicU64,
    /// Record resumptions performed by phase passes.
    pub resumed: AtomicU64,
    /// Records moved to a different phase bucket.
    pub migrated: AtomicU64,
    /// Phase passes run.
    pub passes: AtomicU64,
}

impl RunnerStats {
    #[inline]
    fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> RunnerStatsSnapshot {
        RunnerStatsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            resumed: self.resumed.load(Ordering::Relaxed),
            migrated: self.migrated.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RunnerStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunnerStatsSnapshot {
    pub submitted: u64,
    pub completed: u64,
    pub resumed: u64,
    pub migrated: u64,
    pub passes: u64,
}

/// Cooperative, phase-ordered routine scheduler.
///
/// Construct one per host and share it (typically as `Arc<RoutineRunner>`)
/// with every submission site. Submission may happen from anywhere,
/// including from inside a running routine or a completion callback;
/// phase passes must be driven from a single thread.
#[derive(Debug)]
pub struct RoutineRunner {
    /// Live records, resumed by phase passes.
    buckets: Mutex<PhaseQueues>,
    /// Submissions waiting for the next cycle.
    pending: Mutex<PhaseQueues>,
    /// Serializes submission (including its first resumption) with draining.
    submission: ReentrantMutex<()>,
    ids: Mutex<TaskIdGenerator>,
    stats: RunnerStats,
}

impl RoutineRunner {
    /// Create an empty runner.
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(PhaseQueues::new()),
            pending: Mutex::new(PhaseQueues::new()),
            submission: ReentrantMutex::new(()),
            ids: Mutex::new(TaskIdGenerator::new()),
            stats: RunnerStats::default(),
        }
    }

    /// Submit a computation.
    ///
    /// The computation is resumed once before this returns, which decides
    /// its first phase. It joins that phase's bucket at the start of the next
    /// cycle. If it finishes during that first step, the returned awaiter is
    /// already completed and a callback attached afterwards never fires; use
    /// [`RoutineRunner::run_then`] when that matters.
    pub fn run<C>(
        &self,
        coroutine: C,
        pause: PauseToken,
    ) -> RoutineAwaiter
    where
        C: Coroutine<Output = ()> + 'static,
    {
        let awaiter = RoutineAwaiter::new();
        let notify = awaiter.clone();
        self.submit(Box::new(coroutine), pause, Box::new(move || notify.complete(())));
        awaiter
    }

    /// Submit a computation with its completion callback already attached.
    pub fn run_then<C, F>(
        &self,
        coroutine: C,
        pause: PauseToken,
        on_complete: F,
    ) -> RoutineAwaiter
    where
        C: Coroutine<Output = ()> + 'static,
        F: FnOnce() + Send + 'static,
    {
        let awaiter = RoutineAwaiter::new();
        awaiter.on_complete(on_complete);
        let notify = awaiter.clone();
        self.submit(Box::new(coroutine), pause, Box::new(move || notify.complete(())));
        awaiter
    }

    /// Submit a computation whose completion value is delivered to the
    /// returned awaiter.
    pub fn run_with_result<C, T>(
        &self,
        coroutine: C,
        pause: PauseToken,
    ) -> RoutineAwaiter<T>
    where
        C: Coroutine<Output = T> + 'static,
        T: Send + 'static,
    {
        let awaiter = RoutineAwaiter::new();
        let notify = awaiter.clone();
        let slot = Arc::new(Mutex::new(None));
        let capture = Capture {
            inner: coroutine,
            slot: slot.clone(),
        };
        self.submit(
            Box::new(capture),
            pause,
            Box::new(move || {
                if let Some(value) = slot.lock().take() {
                    notify.complete(value);
                }
            }),
        );
        awaiter
    }

    /// Submit the body of a routine descriptor.
    ///
    /// A pure yield is submitted as a computation that waits for that phase
    /// once and then completes.
    pub fn run_routine(
        &self,
        routine: Routine,
        pause: PauseToken,
    ) -> RoutineAwaiter {
        match routine.into_parts() {
            (_, Some(body)) => self.run(body, pause),
            (phase, None) => self.run(SingleYield(Some(phase)), pause),
        }
    }

    fn submit(
        &self,
        coroutine: BoxCoroutine,
        pause: PauseToken,
        on_finish: Box<dyn FnOnce() + Send>,
    ) -> TaskId {
        let _guard = self.submission.lock();
        let id = self.ids.lock().next();
        RunnerStats::record(&self.stats.submitted);

        let mut record = TaskRecord::new(id, coroutine, pause, on_finish);
        match record.tick() {
            Tick::Running(phase) => {
                debug!(%id, %phase, "routine submitted");
                self.pending.lock().push(phase, record);
            }
            Tick::Finished => {
                debug!(%id, "routine finished on submission");
                RunnerStats::record(&self.stats.completed);
            }
        }
        id
    }

    /// Resume every record in `phase`'s bucket.
    ///
    /// At [`Phase::Initialization`] the pending submissions of every phase
    /// are appended to their buckets first.
    ///
    /// A panic raised by a routine propagates to the caller. The routine
    /// that panicked is dropped without completing; the records not yet
    /// visited in this pass stay in the bucket.
    pub fn run_phase(
        &self,
        phase: Phase,
    ) {
        if phase == Phase::Initialization {
            self.drain_pending();
        }

        let records = self.buckets.lock().take(phase);
        RunnerStats::record(&self.stats.passes);
        if records.is_empty() {
            return;
        }
        trace!(%phase, records = records.len(), "phase pass");

        let mut pass = PhasePass {
            runner: self,
            phase,
            kept: VecDeque::with_capacity(records.len()),
            remaining: records,
            in_flight: None,
        };
        pass.run();
    }

    /// Run one full cycle: every phase in driver order.
    pub fn run_cycle(&self) {
        for phase in Phase::ALL {
            self.run_phase(phase);
        }
    }

    /// Fold pending submissions into their buckets.
    fn drain_pending(&self) {
        let _guard = self.submission.lock();
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return;
        }
        let moved = pending.drain_into(&mut self.buckets.lock());
        trace!(moved, "pending routines added");
    }

    /// Live routines, including pending submissions.
    pub fn len(&self) -> usize {
        self.buckets.lock().len() + self.pending.lock().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether no routine is left to run.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.is_empty()
    }

    /// Records currently in `phase`'s bucket.
    pub fn phase_len(
        &self,
        phase: Phase,
    ) -> usize {
        self.buckets.lock().len_of(phase)
    }

    /// Submissions not yet folded into buckets.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// IDs in `phase`'s bucket, in resumption order.
    pub fn phase_ids(
        &self,
        phase: Phase,
    ) -> Vec<TaskId> {
        self.buckets.lock().ids_of(phase)
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }
}

impl Default for RoutineRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// State of one bucket traversal.
///
/// Records are popped from `remaining` one at a time; survivors of this
/// phase go to `kept`, migrating ones straight to their new bucket. Dropping
/// the pass puts `kept` and `remaining` back, which also covers unwinding.
struct PhasePass<'a> {
    runner: &'a RoutineRunner,
    phase: Phase,
    remaining: VecDeque<TaskRecord>,
    kept: VecDeque<TaskRecord>,
    in_flight: Option<TaskId>,
}

impl PhasePass<'_> {
    fn run(&mut self) {
        let stats = &self.runner.stats;
        while let Some(mut record) = self.remaining.pop_front() {
            self.in_flight = Some(record.id());
            RunnerStats::record(&stats.resumed);
            let tick = record.tick();
            self.in_flight = None;

            match tick {
                Tick::Running(next) if next == self.phase => self.kept.push_back(record),
                Tick::Running(next) => {
                    trace!(id = %record.id(), from = %self.phase, to = %next, "routine migrated");
                    RunnerStats::record(&stats.migrated);
                    self.runner.buckets.lock().push(next, record);
                }
                Tick::Finished => {
                    debug!(id = %record.id(), "routine finished");
                    RunnerStats::record(&stats.completed);
                }
            }
        }
    }
}

impl Drop for PhasePass<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.in_flight {
            warn!(%id, phase = %self.phase, "routine panicked during resumption and was abandoned");
        }
        let mut survivors = std::mem::take(&mut self.kept);
        survivors.append(&mut self.remaining);
        self.runner.buckets.lock().restore(self.phase, survivors);
    }
}

/// Stores the inner computation's result for the completion hook.
struct Capture<C, T> {
    inner: C,
    slot: Arc<Mutex<Option<T>>>,
}

impl<C, T> Coroutine for Capture<C, T>
where
    C: Coroutine<Output = T>,
    T: Send,
{
    type Output = ();

    fn resume(&mut self) -> Step {
        match self.inner.resume() {
            Step::Yielded(routine) => Step::Yielded(routine),
            Step::Completed(value) => {
                *self.slot.lock() = Some(value);
                Step::Completed(())
            }
        }
    }
}

/// Yields one phase, then completes.
struct SingleYield(Option<Phase>);

impl Coroutine for SingleYield {
    type Output = ();

    fn resume(&mut self) -> Step {
        match self.0.take() {
            Some(phase) => Step::Yielded(Routine::yield_at(phase)),
            None => Step::Completed(()),
        }
    }
}
