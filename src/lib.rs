//! Phase Routines
//!
//! A cooperative, single-threaded routine scheduler driven by an external
//! frame loop. Routines are resumable computations that suspend by yielding
//! a [`Routine`] descriptor naming the [`Phase`] of the cycle they want to
//! resume at, optionally with a nested computation to run first.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use phase_routines::{
//!     wait_for_seconds, CancelToken, FrameClock, FrameDriver, PauseToken, RoutineRunner,
//!     Sequence, SharedClock,
//! };
//!
//! let runner = Arc::new(RoutineRunner::new());
//! let clock = Arc::new(FrameClock::new());
//! let shared: SharedClock = clock.clone();
//! let done = Arc::new(AtomicBool::new(false));
//!
//! let flag = done.clone();
//! let routine = Sequence::new()
//!     .wait(move || wait_for_seconds(Duration::from_secs(1), &shared, &CancelToken::none()))
//!     .then(move || flag.store(true, Ordering::SeqCst));
//! runner.run(routine, PauseToken::none());
//!
//! let mut driver = FrameDriver::new(runner.clone(), clock);
//! driver.step_many(60, Duration::from_millis(20));
//! assert!(done.load(Ordering::SeqCst));
//! ```

#![doc(html_root_url = "https://docs.rs/phase-routines")]
#![warn(rust_2018_idioms)]

pub mod runtime;

// Utility modules
pub mod util;

// Re-exports
pub use runtime::awaiter::RoutineAwaiter;
pub use runtime::cancel::{CancelSource, CancelToken};
pub use runtime::clock::{FrameClock, SharedClock, TimeMode, TimeSource};
pub use runtime::pause::{PauseToken, PauseTokenSource};
pub use runtime::phase::{Phase, PhaseTable};
pub use runtime::routine::wait::{
    wait_for_event, wait_for_event1, wait_for_event2, wait_for_fixed_update, wait_for_late_update,
    wait_for_phase, wait_for_seconds, wait_for_seconds_no_pause, wait_for_seconds_realtime,
    wait_for_seconds_realtime_no_pause, wait_for_signal, wait_for_update, wait_until, wait_while,
};
pub use runtime::routine::{
    from_fn, from_iter, BoxCoroutine, Coroutine, FnCoroutine, IterCoroutine, Routine, Sequence,
    Step,
};
pub use runtime::scheduler::{
    DriverError, FrameDriver, RoutineRunner, RunnerStats, RunnerStatsSnapshot, TaskId,
};
pub use runtime::signal::{Callback, Callback1, Callback2, Signal, Signal1, Signal2};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "phase-routines";
