use crate::common::{Harness, FRAME};
use parking_lot::Mutex;
use phase_routines::{from_fn, wait_for_phase, wait_for_update, PauseToken, Phase, Step, TimeSource};
use std::sync::Arc;
use std::time::Duration;

fn stamping(
    harness: &Harness,
    stamps: &Arc<Mutex<Vec<Duration>>>,
    iterations: usize,
) -> impl phase_routines::Coroutine<Output = ()> {
    let clock = harness.clock.clone();
    let stamps = stamps.clone();
    let mut resumed = 0;
    from_fn(move || -> Step {
        if resumed > 0 {
            stamps.lock().push(clock.time());
        }
        if resumed == iterations {
            return Step::Completed(());
        }
        resumed += 1;
        Step::Yielded(wait_for_update())
    })
}

#[test]
fn test_two_routines_record_matching_stamps() {
    let mut harness = Harness::new();
    let a = Arc::new(Mutex::new(Vec::new()));
    let b = Arc::new(Mutex::new(Vec::new()));

    let first = harness.runner.run(stamping(&harness, &a, 60), PauseToken::none());
    let second = harness.runner.run(stamping(&harness, &b, 60), PauseToken::none());

    harness.driver.step_many(70, FRAME);
    assert!(first.is_completed());
    assert!(second.is_completed());

    let a = a.lock();
    let b = b.lock();
    assert_eq!(a.len(), 60);
    assert_eq!(a.len(), b.len());
    assert!(a.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(b.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(*a, *b);
}

#[test]
fn test_every_phase_keeps_its_routines() {
    let harness = Harness::new();
    let current = Arc::new(Mutex::new(Phase::Initialization));
    let seen: Arc<Mutex<Vec<(Phase, Phase)>>> = Arc::new(Mutex::new(Vec::new()));

    for phase in Phase::ALL {
        let current = current.clone();
        let seen = seen.clone();
        let mut submitted = false;
        harness.runner.run(
            from_fn(move || -> Step {
                if submitted {
                    seen.lock().push((phase, *current.lock()));
                }
                submitted = true;
                Step::Yielded(wait_for_phase(phase))
            }),
            PauseToken::none(),
        );
    }

    for _ in 0..10 {
        harness.driver.clock().advance(FRAME);
        for phase in Phase::ALL {
            *current.lock() = phase;
            harness.runner.run_phase(phase);
        }
    }

    let seen = seen.lock();
    assert_eq!(seen.len(), Phase::COUNT * 10);
    assert!(seen.iter().all(|(wanted, actual)| wanted == actual));
}

#[test]
fn test_same_phase_order_is_stable_across_cycles() {
    let mut harness = Harness::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for id in 0..8u32 {
        let order = order.clone();
        harness.runner.run(
            from_fn(move || -> Step {
                order.lock().push(id);
                Step::Yielded(wait_for_phase(Phase::PreUpdate))
            }),
            PauseToken::none(),
        );
    }
    order.lock().clear();

    harness.driver.step_many(5, FRAME);
    let order = order.lock();
    for cycle in order.chunks(8) {
        assert_eq!(cycle, &[0, 1, 2, 3, 4, 5, 6, 7]);
    }
    assert_eq!(order.len(), 40);
}
