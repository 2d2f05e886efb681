//! Routine descriptors and resumable computations
//!
//! A [`Coroutine`] is resumed one step at a time by the runner. Each step
//! either completes or yields a [`Routine`], which names the phase to resume
//! at and optionally carries a nested computation to run first.

pub mod wait;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use crate::runtime::phase::Phase;

/// Result of resuming a computation once.
#[derive(Debug)]
pub enum Step<T = ()> {
    /// Suspended; resume according to the yielded descriptor.
    Yielded(Routine),
    /// Finished, optionally carrying a result value.
    Completed(T),
}

/// A resumable unit of work.
///
/// `resume` is called by the runner at most once per phase pass. It must not
/// block; long waits are expressed by yielding.
pub trait Coroutine: Send {
    /// Value produced on completion.
    type Output;

    /// Advance to the next suspension point.
    fn resume(&mut self) -> Step<Self::Output>;
}

impl<C: Coroutine + ?Sized> Coroutine for Box<C> {
    type Output = C::Output;

    fn resume(&mut self) -> Step<Self::Output> {
        (**self).resume()
    }
}

/// Type-erased computation as stored by the runner.
pub type BoxCoroutine = Box<dyn Coroutine<Output = ()>>;

type Factory = Arc<dyn Fn() -> BoxCoroutine + Send + Sync>;

/// Where a routine's body came from, which decides how it clones.
#[derive(Clone)]
enum Origin {
    /// Pure yield signal.
    Yield,
    /// Replayable body.
    Factory(Factory),
    /// Body handed over as an already-built computation.
    Once,
}

/// Immutable descriptor: "resume at `phase`, running `body` first if any".
pub struct Routine {
    phase: Phase,
    origin: Origin,
    body: Option<BoxCoroutine>,
}

impl Routine {
    /// Pure yield: resume the yielding computation at `phase`.
    #[inline]
    pub fn yield_at(phase: Phase) -> Self {
        Self {
            phase,
            origin: Origin::Yield,
            body: None,
        }
    }

    /// Routine whose body is built by `factory`.
    ///
    /// The factory runs once immediately and again on every [`Clone`], so
    /// each copy owns an independent computation.
    pub fn new<F, C>(
        phase: Phase,
        factory: F,
    ) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Coroutine<Output = ()> + 'static,
    {
        let factory: Factory = Arc::new(move || Box::new(factory()) as BoxCoroutine);
        let body = factory();
        Self {
            phase,
            origin: Origin::Factory(factory),
            body: Some(body),
        }
    }

    /// Wrap an existing computation so it can be yielded as a nested step.
    ///
    /// The computation cannot be rebuilt: a clone of the returned routine
    /// carries an exhausted body that completes as soon as it is awaited.
    pub fn sub_routine<C>(coroutine: C) -> Self
    where
        C: Coroutine<Output = ()> + 'static,
    {
        Self {
            phase: Phase::Update,
            origin: Origin::Once,
            body: Some(Box::new(coroutine)),
        }
    }

    /// Declared phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether this routine carries a nested computation.
    #[inline]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Split into the declared phase and the nested computation.
    pub fn into_parts(self) -> (Phase, Option<BoxCoroutine>) {
        (self.phase, self.body)
    }
}

impl Clone for Routine {
    fn clone(&self) -> Self {
        let body = match &self.origin {
            Origin::Yield => None,
            Origin::Factory(factory) => Some(factory()),
            Origin::Once => Some(Box::new(Exhausted) as BoxCoroutine),
        };
        Self {
            phase: self.phase,
            origin: self.origin.clone(),
            body,
        }
    }
}

impl From<Phase> for Routine {
    fn from(phase: Phase) -> Self {
        Routine::yield_at(phase)
    }
}

impl fmt::Debug for Routine {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let origin = match self.origin {
            Origin::Yield => "yield",
            Origin::Factory(_) => "factory",
            Origin::Once => "once",
        };
        f.debug_struct("Routine")
            .field("phase", &self.phase)
            .field("origin", &origin)
            .field("has_body", &self.has_body())
            .finish()
    }
}

/// Computation that completes on its first resumption.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Exhausted;

impl Coroutine for Exhausted {
    type Output = ();

    fn resume(&mut self) -> Step {
        Step::Completed(())
    }
}

/// Computation driven by a closure, one call per resumption.
pub struct FnCoroutine<F> {
    step: F,
}

impl<F, T> Coroutine for FnCoroutine<F>
where
    F: FnMut() -> Step<T> + Send,
{
    type Output = T;

    fn resume(&mut self) -> Step<T> {
        (self.step)()
    }
}

/// Build a computation from a step closure.
///
/// ```
/// use phase_routines::{from_fn, wait_for_update, Step};
///
/// let mut frames = 0;
/// let counter = from_fn(move || {
///     frames += 1;
///     if frames > 3 {
///         Step::Completed(())
///     } else {
///         Step::Yielded(wait_for_update())
///     }
/// });
/// # let _ = counter;
/// ```
pub fn from_fn<F, T>(step: F) -> FnCoroutine<F>
where
    F: FnMut() -> Step<T> + Send,
{
    FnCoroutine { step }
}

/// Computation yielding every routine of an iterator, then completing.
pub struct IterCoroutine<I> {
    iter: I,
}

impl<I> Coroutine for IterCoroutine<I>
where
    I: Iterator<Item = Routine> + Send,
{
    type Output = ();

    fn resume(&mut self) -> Step {
        match self.iter.next() {
            Some(routine) => Step::Yielded(routine),
            None => Step::Completed(()),
        }
    }
}

/// Build a computation from an iterator of routines.
pub fn from_iter<I>(iter: I) -> IterCoroutine<I::IntoIter>
where
    I: IntoIterator<Item = Routine>,
    I::IntoIter: Send,
{
    IterCoroutine {
        iter: iter.into_iter(),
    }
}

enum Action {
    Run(Box<dyn FnMut() + Send>),
    Wait(Box<dyn FnMut() -> Routine + Send>),
}

/// Straight-line computation: actions run back to back until a wait.
///
/// ```
/// use phase_routines::{wait_for_fixed_update, Sequence};
///
/// let seq = Sequence::new()
///     .then(|| println!("first"))
///     .wait(wait_for_fixed_update)
///     .then(|| println!("one fixed step later"));
/// # let _ = seq;
/// ```
#[derive(Default)]
pub struct Sequence {
    actions: Vec<Action>,
    cursor: usize,
}

impl Sequence {
    /// Create an empty sequence.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a synchronous action.
    pub fn then(
        mut self,
        action: impl FnMut() + Send + 'static,
    ) -> Self {
        self.actions.push(Action::Run(Box::new(action)));
        self
    }

    /// Append a suspension point; `routine` is called when it is reached.
    pub fn wait(
        mut self,
        routine: impl FnMut() -> Routine + Send + 'static,
    ) -> Self {
        self.actions.push(Action::Wait(Box::new(routine)));
        self
    }

    /// Number of actions and waits.
    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Coroutine for Sequence {
    type Output = ();

    fn resume(&mut self) -> Step {
        while let Some(action) = self.actions.get_mut(self.cursor) {
            self.cursor += 1;
            match action {
                Action::Run(run) => run(),
                Action::Wait(wait) => return Step::Yielded(wait()),
            }
        }
        Step::Completed(())
    }
}

impl fmt::Debug for Sequence {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("len", &self.actions.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
