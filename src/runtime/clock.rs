//! Time sources
//!
//! Duration waits read elapsed time from a [`TimeSource`] supplied by the
//! host. [`FrameClock`] is the bundled implementation: the host advances it
//! once per cycle with the measured real frame time.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::runtime::phase::Phase;
use crate::util::config::ClockConfig;

/// Clock readings required by duration-based waits.
///
/// Scaled readings respect the host's time-scale multiplier; unscaled and
/// real readings do not.
pub trait TimeSource: Send + Sync {
    /// Scaled time elapsed since the previous cycle, as seen at `phase`.
    fn delta(
        &self,
        phase: Phase,
    ) -> Duration;

    /// Unscaled time elapsed since the previous cycle, as seen at `phase`.
    fn unscaled_delta(
        &self,
        phase: Phase,
    ) -> Duration;

    /// Scaled time since start.
    fn time(&self) -> Duration;

    /// Real time since start.
    fn realtime(&self) -> Duration;
}

/// Clock handle captured by wait builders.
pub type SharedClock = Arc<dyn TimeSource>;

/// Which clock reading a wait measures against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// Affected by the time scale.
    Scaled,
    /// Wall-clock time, ignores the time scale.
    Real,
}

impl TimeMode {
    /// Per-cycle delta for this mode.
    #[inline]
    pub fn delta(
        self,
        clock: &dyn TimeSource,
        phase: Phase,
    ) -> Duration {
        match self {
            TimeMode::Scaled => clock.delta(phase),
            TimeMode::Real => clock.unscaled_delta(phase),
        }
    }

    /// Absolute time for this mode.
    #[inline]
    pub fn now(
        self,
        clock: &dyn TimeSource,
    ) -> Duration {
        match self {
            TimeMode::Scaled => clock.time(),
            TimeMode::Real => clock.realtime(),
        }
    }
}

#[derive(Debug, Clone)]
struct ClockState {
    time_scale: f64,
    max_delta: Duration,
    delta: Duration,
    unscaled_delta: Duration,
    time: Duration,
    realtime: Duration,
    frame_count: u64,
}

/// Frame-driven clock.
///
/// Every phase of a cycle observes the same delta: the time the host
/// reported for the cycle, clamped to `max_delta`.
#[derive(Debug)]
pub struct FrameClock {
    state: RwLock<ClockState>,
}

impl FrameClock {
    /// Default clamp applied to a single frame's delta.
    pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(333);

    /// Largest accepted time scale.
    pub const MAX_TIME_SCALE: f64 = 1_000.0;

    /// Create a clock at time zero with a time scale of 1.
    pub fn new() -> Self {
        Self::with_time_scale(1.0)
    }

    /// Create a clock with the given time scale.
    pub fn with_time_scale(time_scale: f64) -> Self {
        assert_valid_scale(time_scale);
        Self {
            state: RwLock::new(ClockState {
                time_scale,
                max_delta: Self::DEFAULT_MAX_DELTA,
                delta: Duration::ZERO,
                unscaled_delta: Duration::ZERO,
                time: Duration::ZERO,
                realtime: Duration::ZERO,
                frame_count: 0,
            }),
        }
    }

    /// Create a clock from the `[clock]` config section.
    pub fn from_config(config: &ClockConfig) -> Self {
        let clock = Self::with_time_scale(config.time_scale);
        clock.set_max_delta(config.max_delta());
        clock
    }

    /// Start a new frame that took `real` wall-clock time.
    ///
    /// Returns the scaled delta of the frame.
    pub fn advance(
        &self,
        real: Duration,
    ) -> Duration {
        let mut state = self.state.write();
        let unscaled = real.min(state.max_delta);
        let scaled = Duration::try_from_secs_f64(unscaled.as_secs_f64() * state.time_scale)
            .unwrap_or(Duration::MAX);

        state.unscaled_delta = unscaled;
        state.delta = scaled;
        state.realtime = state.realtime.saturating_add(unscaled);
        state.time = state.time.saturating_add(scaled);
        state.frame_count += 1;
        scaled
    }

    /// Current time scale.
    pub fn time_scale(&self) -> f64 {
        self.state.read().time_scale
    }

    /// Change the time scale; applies from the next frame.
    ///
    /// # Panics
    ///
    /// Panics if `time_scale` is negative, not finite or above
    /// [`Self::MAX_TIME_SCALE`].
    pub fn set_time_scale(
        &self,
        time_scale: f64,
    ) {
        assert_valid_scale(time_scale);
        self.state.write().time_scale = time_scale;
    }

    /// Upper bound for a single frame's delta.
    pub fn max_delta(&self) -> Duration {
        self.state.read().max_delta
    }

    pub fn set_max_delta(
        &self,
        max_delta: Duration,
    ) {
        self.state.write().max_delta = max_delta;
    }

    /// Frames advanced so far.
    pub fn frame_count(&self) -> u64 {
        self.state.read().frame_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for FrameClock {
    fn delta(
        &self,
        _phase: Phase,
    ) -> Duration {
        self.state.read().delta
    }

    fn unscaled_delta(
        &self,
        _phase: Phase,
    ) -> Duration {
        self.state.read().unscaled_delta
    }

    fn time(&self) -> Duration {
        self.state.read().time
    }

    fn realtime(&self) -> Duration {
        self.state.read().realtime
    }
}

/// Whether `time_scale` is accepted by [`FrameClock`].
pub fn is_valid_scale(time_scale: f64) -> bool {
    (0.0..=FrameClock::MAX_TIME_SCALE).contains(&time_scale)
}

fn assert_valid_scale(time_scale: f64) {
    assert!(
        is_valid_scale(time_scale),
        "time scale must be within 0..={}, got {}",
        FrameClock::MAX_TIME_SCALE,
        time_scale
    );
}
