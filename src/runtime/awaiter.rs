//! Completion notifier returned on submission

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Callback<T> = Box<dyn FnOnce(T) + Send>;

struct AwaiterState<T> {
    callback: Option<Callback<T>>,
    completed: bool,
}

/// Single-shot completion notifier for a submitted routine.
///
/// Holds at most one callback; attaching another replaces it. The callback
/// fires once, when the routine's whole nested chain is exhausted. A
/// completion that happens before any callback is attached is not replayed,
/// so a routine finishing during its synchronous first step is only visible
/// through [`RoutineAwaiter::is_completed`] (or by submitting with
/// `RoutineRunner::run_then`).
pub struct RoutineAwaiter<T = ()> {
    state: Arc<Mutex<AwaiterState<T>>>,
}

impl<T> RoutineAwaiter<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(AwaiterState {
                callback: None,
                completed: false,
            })),
        }
    }

    /// Attach the completion callback.
    pub fn then(
        &self,
        callback: impl FnOnce(T) + Send + 'static,
    ) {
        self.state.lock().callback = Some(Box::new(callback));
    }

    /// Whether the routine has finished.
    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }

    pub(crate) fn complete(
        &self,
        value: T,
    ) {
        let callback = {
            let mut state = self.state.lock();
            if state.completed {
                return;
            }
            state.completed = true;
            state.callback.take()
        };
        if let Some(callback) = callback {
            callback(value);
        }
    }
}

impl RoutineAwaiter<()> {
    /// Unit-result shorthand for [`RoutineAwaiter::then`].
    pub fn on_complete(
        &self,
        callback: impl FnOnce() + Send + 'static,
    ) {
        self.then(move |()| callback());
    }
}

impl<T> Clone for RoutineAwaiter<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> fmt::Debug for RoutineAwaiter<T> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RoutineAwaiter")
            .field("completed", &state.completed)
            .field("has_callback", &state.callback.is_some())
            .finish()
    }
}
