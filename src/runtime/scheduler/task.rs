//! Task records: the runner's bookkeeping for one submitted computation.

use smallvec::SmallVec;

use crate::runtime::pause::PauseToken;
use crate::runtime::phase::Phase;
use crate::runtime::routine::{BoxCoroutine, Step};

/// Unique identifier of a submitted routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Get the inner value.
    #[inline]
    pub fn inner(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(val: u64) -> Self {
        Self(val)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "Routine({})", self.0)
    }
}

/// Sequential task ID source.
#[derive(Debug, Default)]
pub struct TaskIdGenerator {
    next_id: u64,
}

impl TaskIdGenerator {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next task ID.
    #[inline]
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        TaskId(id)
    }
}

/// Outcome of resuming a record once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Still alive; belongs in the bucket of this phase.
    Running(Phase),
    /// Chain exhausted; the completion hook has fired.
    Finished,
}

type CompletionHook = Box<dyn FnOnce() + Send>;

/// One submitted computation and its nested resumption chain.
///
/// `current` is the only computation ever resumed; `parents` holds the
/// suspended callers of `current`, innermost last.
pub(crate) struct TaskRecord {
    id: TaskId,
    pause: PauseToken,
    parents: SmallVec<[BoxCoroutine; 4]>,
    current: Option<BoxCoroutine>,
    last_phase: Phase,
    on_finish: Option<CompletionHook>,
}

impl TaskRecord {
    pub(crate) fn new(
        id: TaskId,
        coroutine: BoxCoroutine,
        pause: PauseToken,
        on_finish: CompletionHook,
    ) -> Self {
        Self {
            id,
            pause,
            parents: SmallVec::new(),
            current: Some(coroutine),
            last_phase: Phase::default(),
            on_finish: Some(on_finish),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    /// Phase reported by the most recent pure yield.
    #[cfg(test)]
    pub(crate) fn last_phase(&self) -> Phase {
        self.last_phase
    }

    /// Number of live computations in the chain.
    #[inline]
    pub(crate) fn depth(&self) -> usize {
        self.parents.len() + usize::from(self.current.is_some())
    }

    /// Resume until the chain yields a pure phase or is exhausted.
    ///
    /// A yielded sub-routine replaces `current` and is resumed in the same
    /// call; a finished computation hands control back to its parent, also in
    /// the same call. A paused record does not advance and stays at its last
    /// phase.
    pub(crate) fn tick(&mut self) -> Tick {
        loop {
            let Some(current) = self.current.as_mut() else {
                if let Some(on_finish) = self.on_finish.take() {
                    on_finish();
                }
                return Tick::Finished;
            };

            if self.pause.is_paused() {
                return Tick::Running(self.last_phase);
            }

            match current.resume() {
                Step::Completed(()) => {
                    self.current = self.parents.pop();
                }
                Step::Yielded(routine) => match routine.into_parts() {
                    (_, Some(body)) => {
                        if let Some(parent) = self.current.replace(body) {
                            self.parents.push(parent);
                        }
                    }
                    (phase, None) => {
                        self.last_phase = phase;
                        return Tick::Running(phase);
                    }
                },
            }
        }
    }
}

impl std::fmt::Debug for TaskRecord {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("TaskRecord")
            .field("id", &self.id)
            .field("depth", &self.depth())
            .field("last_phase", &self.last_phase)
            .field("paused", &self.pause.is_paused())
            .finish()
    }
}
