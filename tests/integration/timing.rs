use crate::common::{completion_flag, Harness, FRAME};
use phase_routines::{
    wait_for_seconds, wait_for_seconds_no_pause, wait_for_seconds_realtime,
    wait_for_seconds_realtime_no_pause, CancelToken, PauseToken, PauseTokenSource, Sequence,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SECOND: Duration = Duration::from_secs(1);

/// Frames until a one-second wait built by `build` completes.
fn frames_for(
    scale: f64,
    build: fn(Duration, &phase_routines::SharedClock, &CancelToken) -> phase_routines::Routine,
) -> u64 {
    let mut harness = Harness::with_time_scale(scale);
    let routine = build(SECOND, &harness.clock, &CancelToken::none());
    let awaiter = harness.runner.run_routine(routine, PauseToken::none());
    let done = completion_flag(&awaiter);
    harness.frames_until(&done, 1_000).expect("wait never completed")
}

#[test]
fn test_scaled_wait_tracks_time_scale() {
    // 64 frames per second of scaled time, plus the resumption that sees it.
    assert_eq!(frames_for(1.0, wait_for_seconds), 65);
    assert_eq!(frames_for(2.0, wait_for_seconds), 33);
    assert_eq!(frames_for(0.5, wait_for_seconds), 129);
}

#[test]
fn test_realtime_wait_ignores_time_scale() {
    for scale in [0.5, 1.0, 2.0] {
        assert_eq!(frames_for(scale, wait_for_seconds_realtime), 65);
    }
}

#[test]
fn test_deadline_waits_track_clock() {
    assert_eq!(frames_for(1.0, wait_for_seconds_no_pause), 64);
    assert_eq!(frames_for(2.0, wait_for_seconds_no_pause), 32);
    assert_eq!(frames_for(0.5, wait_for_seconds_realtime_no_pause), 64);
}

#[test]
fn test_pause_delays_elapsed_wait_but_not_deadline_wait() {
    let mut harness = Harness::new();
    let source = PauseTokenSource::new();
    let none = CancelToken::none();

    let elapsed = harness.runner.run_routine(
        wait_for_seconds(SECOND, &harness.clock, &none),
        source.token(),
    );
    let deadline = harness.runner.run_routine(
        wait_for_seconds_no_pause(SECOND, &harness.clock, &none),
        source.token(),
    );
    let elapsed_done = completion_flag(&elapsed);
    let deadline_done = completion_flag(&deadline);

    harness.driver.step_many(16, FRAME);
    source.pause();
    harness.driver.step_many(64, FRAME);
    source.resume();

    // The deadline passed while paused; it is noticed on the next resumption.
    harness.driver.step(FRAME);
    assert!(deadline_done.load(Ordering::SeqCst));
    assert!(!elapsed_done.load(Ordering::SeqCst));

    // 16 frames accumulated before the pause, 48 more are needed.
    let remaining = harness.frames_until(&elapsed_done, 200);
    assert_eq!(remaining, Some(48));
}

#[test]
fn test_paused_interval_extends_wait_by_at_least_that_interval() {
    let unpaused = {
        let mut harness = Harness::new();
        let awaiter = harness.runner.run_routine(
            wait_for_seconds(SECOND, &harness.clock, &CancelToken::none()),
            PauseToken::none(),
        );
        let done = completion_flag(&awaiter);
        harness.frames_until(&done, 500).unwrap()
    };

    let mut harness = Harness::new();
    let source = PauseTokenSource::new();
    let awaiter = harness.runner.run_routine(
        wait_for_seconds(SECOND, &harness.clock, &CancelToken::none()),
        source.token(),
    );
    let done = completion_flag(&awaiter);
    harness.driver.step_many(10, FRAME);
    source.pause();
    harness.driver.step_many(30, FRAME);
    source.resume();
    let paused = 40 + harness.frames_until(&done, 500).unwrap();

    assert!(paused >= unpaused + 30);
}

#[test]
fn test_one_second_in_real_time() {
    let mut harness = Harness::new();
    let flag = Arc::new(AtomicBool::new(false));
    let set = flag.clone();
    let clock = harness.clock.clone();

    harness.runner.run(
        Sequence::new()
            .wait(move || wait_for_seconds(SECOND, &clock, &CancelToken::none()))
            .then(move || set.store(true, Ordering::SeqCst)),
        PauseToken::none(),
    );

    let start = Instant::now();
    let seen = flag.clone();
    harness
        .driver
        .run_until(
            move || seen.load(Ordering::SeqCst),
            Duration::from_millis(5),
            Duration::from_secs(5),
        )
        .unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= SECOND, "finished early: {:?}", elapsed);
    assert!(elapsed <= SECOND + Duration::from_millis(250), "finished late: {:?}", elapsed);
}
