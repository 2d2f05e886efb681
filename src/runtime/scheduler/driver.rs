//! Host-side frame driver
//!
//! Pairs a runner with a [`FrameClock`] and plays the role of the engine's
//! frame loop: advance the clock, then run every phase once, in order.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use super::RoutineRunner;
use crate::runtime::clock::{FrameClock, SharedClock};
use crate::util::config::DriverConfig;

/// Driver errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("condition not reached after {cycles} cycles ({elapsed:?})")]
    Timeout { cycles: u64, elapsed: Duration },

    #[error("cadence must be at least 1 Hz, got {0}")]
    InvalidCadence(u32),
}

/// Drives a [`RoutineRunner`] one cycle at a time.
#[derive(Debug)]
pub struct FrameDriver {
    runner: Arc<RoutineRunner>,
    clock: Arc<FrameClock>,
    cycles: u64,
}

impl FrameDriver {
    pub fn new(
        runner: Arc<RoutineRunner>,
        clock: Arc<FrameClock>,
    ) -> Self {
        Self {
            runner,
            clock,
            cycles: 0,
        }
    }

    /// Frame period for the `[driver]` config section.
    pub fn cadence_from_config(config: &DriverConfig) -> Result<Duration, DriverError> {
        if config.cadence_hz == 0 {
            return Err(DriverError::InvalidCadence(config.cadence_hz));
        }
        Ok(Duration::from_secs(1) / config.cadence_hz)
    }

    #[inline]
    pub fn runner(&self) -> &Arc<RoutineRunner> {
        &self.runner
    }

    #[inline]
    pub fn clock(&self) -> &Arc<FrameClock> {
        &self.clock
    }

    /// The clock as captured by wait builders.
    pub fn shared_clock(&self) -> SharedClock {
        self.clock.clone()
    }

    /// Cycles run so far.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle that took `real` wall-clock time.
    pub fn step(
        &mut self,
        real: Duration,
    ) {
        self.clock.advance(real);
        self.runner.run_cycle();
        self.cycles += 1;
    }

    /// Run `count` cycles of `real` each.
    pub fn step_many(
        &mut self,
        count: u64,
        real: Duration,
    ) {
        for _ in 0..count {
            self.step(real);
        }
    }

    /// Run cycles in real time at `cadence` until `done` returns true.
    ///
    /// Each cycle advances the clock by the measured time since the previous
    /// one. `done` is checked before every cycle. Returns the number of
    /// cycles run.
    pub fn run_until(
        &mut self,
        mut done: impl FnMut() -> bool,
        cadence: Duration,
        timeout: Duration,
    ) -> Result<u64, DriverError> {
        let start = Instant::now();
        let mut last = start;
        let mut cycles = 0;

        loop {
            if done() {
                debug!(cycles, elapsed = ?start.elapsed(), "driver condition reached");
                return Ok(cycles);
            }
            if start.elapsed() >= timeout {
                return Err(DriverError::Timeout {
                    cycles,
                    elapsed: start.elapsed(),
                });
            }

            let since_last = last.elapsed();
            if since_last < cadence {
                thread::sleep(cadence - since_last);
            }
            let now = Instant::now();
            self.step(now - last);
            last = now;
            cycles += 1;
        }
    }
}
