//! Shared fixtures for the integration tests.

use phase_routines::{FrameClock, FrameDriver, RoutineAwaiter, RoutineRunner, SharedClock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 1/64 s, exactly representable as f64 seconds.
pub const FRAME: Duration = Duration::from_micros(15_625);

pub struct Harness {
    pub runner: Arc<RoutineRunner>,
    pub clock: SharedClock,
    pub driver: FrameDriver,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_time_scale(1.0)
    }

    pub fn with_time_scale(scale: f64) -> Self {
        let runner = Arc::new(RoutineRunner::new());
        let frame_clock = Arc::new(FrameClock::with_time_scale(scale));
        let clock: SharedClock = frame_clock.clone();
        let driver = FrameDriver::new(runner.clone(), frame_clock);
        Self {
            runner,
            clock,
            driver,
        }
    }

    /// Step fixed frames until `done` is set; returns the number of steps.
    pub fn frames_until(
        &mut self,
        done: &Arc<AtomicBool>,
        limit: u64,
    ) -> Option<u64> {
        for step in 1..=limit {
            self.driver.step(FRAME);
            if done.load(Ordering::SeqCst) {
                return Some(step);
            }
        }
        None
    }
}

/// Flag set by the awaiter's completion callback.
pub fn completion_flag(awaiter: &RoutineAwaiter) -> Arc<AtomicBool> {
    let done = Arc::new(AtomicBool::new(false));
    let flag = done.clone();
    awaiter.on_complete(move || flag.store(true, Ordering::SeqCst));
    done
}
