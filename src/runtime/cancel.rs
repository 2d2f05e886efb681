//! Cooperative cancellation signal
//!
//! Waits poll [`CancelToken::is_cancelled`] once per loop iteration; nothing
//! is interrupted asynchronously.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Side that requests cancellation.
#[derive(Debug, Default)]
pub struct CancelSource {
    cancelled: Arc<AtomicBool>,
}

impl CancelSource {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            cancelled: Some(self.cancelled.clone()),
        }
    }

    /// Request cancellation. Irreversible.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Read-only cancellation view; the default token is never cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Option<Arc<AtomicBool>>,
}

impl CancelToken {
    /// Token that is never cancelled.
    #[inline]
    pub fn none() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
            .as_ref()
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }
}
