//! Suspension-point builders
//!
//! Each builder returns a [`Routine`] whose body loops, re-yielding a fixed
//! phase, until its condition holds. Cancellation is polled at the top of
//! every iteration; a cancelled wait completes without yielding again.
//!
//! Bodies are built eagerly with the routine, but nothing observable happens
//! before the first resumption: deadlines are captured and event callbacks
//! subscribed on the first `resume`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{Coroutine, Routine, Step};
use crate::runtime::cancel::CancelToken;
use crate::runtime::clock::{SharedClock, TimeMode};
use crate::runtime::phase::Phase;
use crate::runtime::signal::{Callback, Callback1, Callback2, Signal};

/// Phase of all duration waits.
const TIMER_PHASE: Phase = Phase::FixedUpdate;
/// Phase of predicate and event waits.
const CONDITION_PHASE: Phase = Phase::PreUpdate;

/// Resume at `phase`.
#[inline]
pub fn wait_for_phase(phase: Phase) -> Routine {
    Routine::yield_at(phase)
}

#[inline]
pub fn wait_for_update() -> Routine {
    wait_for_phase(Phase::Update)
}

#[inline]
pub fn wait_for_fixed_update() -> Routine {
    wait_for_phase(Phase::FixedUpdate)
}

/// Resume at [`Phase::PreLateUpdate`].
#[inline]
pub fn wait_for_late_update() -> Routine {
    wait_for_phase(Phase::PreLateUpdate)
}

/// Wait until `duration` of scaled time has accumulated.
///
/// Time only accumulates while the routine is actually resumed, so pausing
/// the owning record extends the wait by the paused interval.
pub fn wait_for_seconds(
    duration: Duration,
    clock: &SharedClock,
    cancel: &CancelToken,
) -> Routine {
    elapsed_wait(duration, TimeMode::Scaled, clock, cancel)
}

/// Like [`wait_for_seconds`] but accumulates unscaled time.
pub fn wait_for_seconds_realtime(
    duration: Duration,
    clock: &SharedClock,
    cancel: &CancelToken,
) -> Routine {
    elapsed_wait(duration, TimeMode::Real, clock, cancel)
}

/// Wait until the scaled clock reaches `start + duration`.
///
/// The deadline is absolute: time spent paused still counts, and a deadline
/// that passes while paused is seen as expired on the next resumption.
pub fn wait_for_seconds_no_pause(
    duration: Duration,
    clock: &SharedClock,
    cancel: &CancelToken,
) -> Routine {
    deadline_wait(duration, TimeMode::Scaled, clock, cancel)
}

/// Like [`wait_for_seconds_no_pause`] but against real time.
pub fn wait_for_seconds_realtime_no_pause(
    duration: Duration,
    clock: &SharedClock,
    cancel: &CancelToken,
) -> Routine {
    deadline_wait(duration, TimeMode::Real, clock, cancel)
}

/// Wait until `predicate` returns true, evaluating it once per cycle.
pub fn wait_until<P>(
    predicate: P,
    cancel: &CancelToken,
) -> Routine
where
    P: Fn() -> bool + Send + Sync + 'static,
{
    condition_wait(Arc::new(predicate), true, cancel)
}

/// Wait while `predicate` returns true, evaluating it once per cycle.
pub fn wait_while<P>(
    predicate: P,
    cancel: &CancelToken,
) -> Routine
where
    P: Fn() -> bool + Send + Sync + 'static,
{
    condition_wait(Arc::new(predicate), false, cancel)
}

/// Wait for an event without payload.
///
/// `subscribe` and `unsubscribe` receive the same callback instance.
/// Unsubscription happens once the wait resolves or is cancelled, or when
/// the routine is dropped mid-wait.
pub fn wait_for_event<S, U>(
    subscribe: S,
    unsubscribe: U,
    cancel: &CancelToken,
) -> Routine
where
    S: Fn(Callback) + Send + Sync + 'static,
    U: Fn(Callback) + Send + Sync + 'static,
{
    event_wait::<Callback>(Arc::new(subscribe), Arc::new(unsubscribe), flag_callback, cancel)
}

/// Wait for an event with one payload argument; the payload is ignored.
pub fn wait_for_event1<T, S, U>(
    subscribe: S,
    unsubscribe: U,
    cancel: &CancelToken,
) -> Routine
where
    T: 'static,
    S: Fn(Callback1<T>) + Send + Sync + 'static,
    U: Fn(Callback1<T>) + Send + Sync + 'static,
{
    event_wait::<Callback1<T>>(
        Arc::new(subscribe),
        Arc::new(unsubscribe),
        flag_callback1::<T>,
        cancel,
    )
}

/// Wait for an event with two payload arguments; the payload is ignored.
pub fn wait_for_event2<T, T2, S, U>(
    subscribe: S,
    unsubscribe: U,
    cancel: &CancelToken,
) -> Routine
where
    T: 'static,
    T2: 'static,
    S: Fn(Callback2<T, T2>) + Send + Sync + 'static,
    U: Fn(Callback2<T, T2>) + Send + Sync + 'static,
{
    event_wait::<Callback2<T, T2>>(
        Arc::new(subscribe),
        Arc::new(unsubscribe),
        flag_callback2::<T, T2>,
        cancel,
    )
}

/// [`wait_for_event`] bound to a [`Signal`].
pub fn wait_for_signal(
    signal: &Arc<Signal>,
    cancel: &CancelToken,
) -> Routine {
    let on = signal.clone();
    let off = signal.clone();
    wait_for_event(
        move |callback| on.subscribe(callback),
        move |callback| {
            off.unsubscribe(&callback);
        },
        cancel,
    )
}

fn elapsed_wait(
    duration: Duration,
    mode: TimeMode,
    clock: &SharedClock,
    cancel: &CancelToken,
) -> Routine {
    let clock = clock.clone();
    let cancel = cancel.clone();
    Routine::new(TIMER_PHASE, move || ElapsedWait {
        duration,
        elapsed: Duration::ZERO,
        mode,
        clock: clock.clone(),
        cancel: cancel.clone(),
    })
}

fn deadline_wait(
    duration: Duration,
    mode: TimeMode,
    clock: &SharedClock,
    cancel: &CancelToken,
) -> Routine {
    let clock = clock.clone();
    let cancel = cancel.clone();
    Routine::new(TIMER_PHASE, move || DeadlineWait {
        duration,
        deadline: None,
        mode,
        clock: clock.clone(),
        cancel: cancel.clone(),
    })
}

type Predicate = Arc<dyn Fn() -> bool + Send + Sync>;

fn condition_wait(
    predicate: Predicate,
    until: bool,
    cancel: &CancelToken,
) -> Routine {
    let cancel = cancel.clone();
    Routine::new(CONDITION_PHASE, move || ConditionWait {
        predicate: predicate.clone(),
        until,
        cancel: cancel.clone(),
    })
}

type Hook<Cb> = Arc<dyn Fn(Cb) + Send + Sync>;

fn event_wait<Cb>(
    subscribe: Hook<Cb>,
    unsubscribe: Hook<Cb>,
    make_callback: fn(Arc<AtomicBool>) -> Cb,
    cancel: &CancelToken,
) -> Routine
where
    Cb: Clone + Send + 'static,
{
    let cancel = cancel.clone();
    Routine::new(CONDITION_PHASE, move || EventWait {
        subscribe: subscribe.clone(),
        unsubscribe: unsubscribe.clone(),
        make_callback,
        cancel: cancel.clone(),
        state: EventState::Idle,
    })
}

fn flag_callback(fired: Arc<AtomicBool>) -> Callback {
    Arc::new(move || fired.store(true, Ordering::SeqCst))
}

fn flag_callback1<T: 'static>(fired: Arc<AtomicBool>) -> Callback1<T> {
    Arc::new(move |_: T| fired.store(true, Ordering::SeqCst))
}

fn flag_callback2<T: 'static, T2: 'static>(fired: Arc<AtomicBool>) -> Callback2<T, T2> {
    Arc::new(move |_: T, _: T2| fired.store(true, Ordering::SeqCst))
}

/// Accumulates per-cycle deltas until `duration` is reached.
struct ElapsedWait {
    duration: Duration,
    elapsed: Duration,
    mode: TimeMode,
    clock: SharedClock,
    cancel: CancelToken,
}

impl Coroutine for ElapsedWait {
    type Output = ();

    fn resume(&mut self) -> Step {
        if self.cancel.is_cancelled() || self.elapsed >= self.duration {
            return Step::Completed(());
        }
        self.elapsed = self
            .elapsed
            .saturating_add(self.mode.delta(self.clock.as_ref(), TIMER_PHASE));
        Step::Yielded(wait_for_phase(TIMER_PHASE))
    }
}

/// Compares the clock against a deadline captured on first resumption.
struct DeadlineWait {
    duration: Duration,
    deadline: Option<Duration>,
    mode: TimeMode,
    clock: SharedClock,
    cancel: CancelToken,
}

impl Coroutine for DeadlineWait {
    type Output = ();

    fn resume(&mut self) -> Step {
        let now = self.mode.now(self.clock.as_ref());
        let deadline = *self.deadline.get_or_insert(now.saturating_add(self.duration));
        if self.cancel.is_cancelled() || deadline <= now {
            return Step::Completed(());
        }
        Step::Yielded(wait_for_phase(TIMER_PHASE))
    }
}

/// Re-yields until the predicate equals `until`.
struct ConditionWait {
    predicate: Predicate,
    until: bool,
    cancel: CancelToken,
}

impl Coroutine for ConditionWait {
    type Output = ();

    fn resume(&mut self) -> Step {
        if self.cancel.is_cancelled() || (self.predicate)() == self.until {
            return Step::Completed(());
        }
        Step::Yielded(wait_for_phase(CONDITION_PHASE))
    }
}

enum EventState<Cb> {
    Idle,
    Subscribed(Cb),
    Done,
}

/// Subscribes a flag-setting callback, then delegates to a predicate wait.
struct EventWait<Cb> {
    subscribe: Hook<Cb>,
    unsubscribe: Hook<Cb>,
    make_callback: fn(Arc<AtomicBool>) -> Cb,
    cancel: CancelToken,
    state: EventState<Cb>,
}

impl<Cb> EventWait<Cb> {
    fn release(&mut self) {
        if let EventState::Subscribed(callback) = std::mem::replace(&mut self.state, EventState::Done) {
            (self.unsubscribe)(callback);
        }
    }
}

impl<Cb> Coroutine for EventWait<Cb>
where
    Cb: Clone + Send + 'static,
{
    type Output = ();

    fn resume(&mut self) -> Step {
        match self.state {
            EventState::Idle => {
                let fired = Arc::new(AtomicBool::new(false));
                let callback = (self.make_callback)(fired.clone());
                (self.subscribe)(callback.clone());
                self.state = EventState::Subscribed(callback);
                Step::Yielded(wait_until(
                    move || fired.load(Ordering::SeqCst),
                    &self.cancel,
                ))
            }
            EventState::Subscribed(_) => {
                self.release();
                Step::Completed(())
            }
            EventState::Done => Step::Completed(()),
        }
    }
}

impl<Cb> Drop for EventWait<Cb> {
    fn drop(&mut self) {
        self.release();
    }
}
