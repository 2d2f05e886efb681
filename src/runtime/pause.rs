//! Pause gates shared between routines
//!
//! A [`PauseTokenSource`] owns the flag; [`PauseToken`]s are read-only views
//! handed to the runner at submission. Dropping the source severs every
//! token, which then reads as "not paused" forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Owner of a pause flag.
#[derive(Debug, Default)]
pub struct PauseTokenSource {
    paused: Arc<AtomicBool>,
}

impl PauseTokenSource {
    /// Create a source in the resumed state.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token observing this source.
    pub fn token(&self) -> PauseToken {
        PauseToken {
            source: Some(Arc::downgrade(&self.paused)),
        }
    }

    /// Stop advancing every routine gated by this source.
    #[inline]
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Let gated routines advance again.
    #[inline]
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Release the source; outstanding tokens stop pausing.
    pub fn dispose(self) {
        drop(self);
    }
}

/// Read-only view of a [`PauseTokenSource`].
///
/// The default token is not attached to any source and never pauses.
#[derive(Debug, Clone, Default)]
pub struct PauseToken {
    source: Option<Weak<AtomicBool>>,
}

impl PauseToken {
    /// Token that never pauses.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.source
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    #[inline]
    pub fn is_resumed(&self) -> bool {
        !self.is_paused()
    }

    /// Whether the originating source is still alive.
    pub fn is_attached(&self) -> bool {
        self.source
            .as_ref()
            .map(|weak| weak.strong_count() > 0)
            .unwrap_or(false)
    }
}
