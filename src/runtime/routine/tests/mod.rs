//! Routine descriptor and adapter tests


use crate::runtime::phase::Phase;
use crate::runtime::routine::wait::{wait_for_fixed_update, wait_for_update};
use crate::runtime::routine::{from_fn, from_iter, BoxCoroutine, Coroutine, Routine, Sequence, Step};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Body that completes after `frames` resumptions, bumping `counter` on each.
fn counted(
    counter: &Arc<AtomicUsize>,
    frames: usize,
) -> impl Coroutine<Output = ()> {
    let counter = counter.clone();
    let mut left = frames;
    from_fn(move || -> Step {
        counter.fetch_add(1, Ordering::SeqCst);
        if left == 0 {
            return Step::Completed(());
        }
        left -= 1;
        Step::Yielded(wait_for_update())
    })
}

fn resume_body(routine: Routine) -> (Phase, Step) {
    let (phase, body) = routine.into_parts();
    let mut body: BoxCoroutine = body.expect("routine has a body");
    (phase, body.resume())
}

#[test]
fn test_yield_routine_has_no_body() {
    let routine = Routine::yield_at(Phase::PreLateUpdate);
    assert_eq!(routine.phase(), Phase::PreLateUpdate);
    assert!(!routine.has_body());

    let from: Routine = Phase::EarlyUpdate.into();
    assert_eq!(from.phase(), Phase::EarlyUpdate);
    assert!(!from.has_body());
}

#[test]
fn test_factory_runs_on_construction_and_clone() {
    let calls = Arc::new(AtomicUsize::new(0));
    let count = calls.clone();
    let routine = Routine::new(Phase::Update, move || {
        count.fetch_add(1, Ordering::SeqCst);
        Sequence::new()
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(routine.has_body());

    let copy = routine.clone();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(copy.phase(), Phase::Update);
}

#[test]
fn test_clones_advance_independently() {
    let counter = Arc::new(AtomicUsize::new(0));
    let factory_counter = counter.clone();
    let routine = Routine::new(Phase::Update, move || counted(&factory_counter, 1));
    let copy = routine.clone();

    let (_, body) = routine.into_parts();
    let mut original = body.unwrap();
    assert!(matches!(original.resume(), Step::Yielded(_)));
    assert!(matches!(original.resume(), Step::Completed(())));

    // The copy starts from the beginning.
    let (_, body) = copy.into_parts();
    let mut copy = body.unwrap();
    assert!(matches!(copy.resume(), Step::Yielded(_)));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_sub_routine_clone_is_exhausted() {
    let counter = Arc::new(AtomicUsize::new(0));
    let routine = Routine::sub_routine(counted(&counter, 5));
    let copy = routine.clone();

    assert!(copy.has_body());
    let (_, step) = resume_body(copy);
    assert!(matches!(step, Step::Completed(())));
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let (_, step) = resume_body(routine);
    assert!(matches!(step, Step::Yielded(_)));
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_routine_debug() {
    let routine = Routine::new(Phase::FixedUpdate, Sequence::new);
    let debug = format!("{:?}", routine);
    assert!(debug.contains("FixedUpdate"));
    assert!(debug.contains("factory"));

    let debug = format!("{:?}", Routine::yield_at(Phase::Update));
    assert!(debug.contains("yield"));
}

#[test]
fn test_from_iter_yields_each_routine() {
    let mut coroutine = from_iter(vec![
        wait_for_fixed_update(),
        wait_for_update(),
        Routine::yield_at(Phase::PostLateUpdate),
    ]);

    let mut phases = Vec::new();
    while let Step::Yielded(routine) = coroutine.resume() {
        phases.push(routine.phase());
    }
    assert_eq!(
        phases,
        vec![Phase::FixedUpdate, Phase::Update, Phase::PostLateUpdate]
    );
}

#[test]
fn test_sequence_runs_actions_until_wait() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let (a, b, c) = (log.clone(), log.clone(), log.clone());
    let mut seq = Sequence::new()
        .then(move || a.lock().push("a"))
        .then(move || b.lock().push("b"))
        .wait(wait_for_fixed_update)
        .then(move || c.lock().push("c"));
    assert_eq!(seq.len(), 4);
    assert!(!seq.is_empty());

    match seq.resume() {
        Step::Yielded(routine) => assert_eq!(routine.phase(), Phase::FixedUpdate),
        Step::Completed(()) => panic!("sequence finished early"),
    }
    assert_eq!(*log.lock(), vec!["a", "b"]);

    assert!(matches!(seq.resume(), Step::Completed(())));
    assert_eq!(*log.lock(), vec!["a", "b", "c"]);
    assert!(matches!(seq.resume(), Step::Completed(())));
}

#[test]
fn test_empty_sequence_completes() {
    let mut seq = Sequence::new();
    assert!(seq.is_empty());
    assert!(matches!(seq.resume(), Step::Completed(())));
}

#[test]
fn test_from_fn_carries_output() {
    let mut remaining = 2;
    let mut coroutine = from_fn(move || {
        if remaining == 0 {
            Step::Completed("done")
        } else {
            remaining -= 1;
            Step::Yielded(wait_for_update())
        }
    });

    assert!(matches!(coroutine.resume(), Step::Yielded(_)));
    assert!(matches!(coroutine.resume(), Step::Yielded(_)));
    assert!(matches!(coroutine.resume(), Step::Completed("done")));
}
