//! Multicast event sources
//!
//! Callbacks are reference-counted closures; unsubscribing removes the exact
//! instance that was subscribed (`Arc::ptr_eq`), which is what the event
//! waits rely on.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Callback without payload.
pub type Callback = Arc<dyn Fn() + Send + Sync>;
/// Callback with one payload argument.
pub type Callback1<T> = Arc<dyn Fn(T) + Send + Sync>;
/// Callback with two payload arguments.
pub type Callback2<T, T2> = Arc<dyn Fn(T, T2) + Send + Sync>;

struct Subscribers<F: ?Sized> {
    entries: Mutex<Vec<Arc<F>>>,
}

impl<F: ?Sized> Subscribers<F> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn subscribe(
        &self,
        callback: Arc<F>,
    ) {
        self.entries.lock().push(callback);
    }

    fn unsubscribe(
        &self,
        callback: &Arc<F>,
    ) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|entry| Arc::ptr_eq(entry, callback)) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    // Callbacks may (un)subscribe while being invoked.
    fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries.lock().clone()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Event without payload.
pub struct Signal {
    subscribers: Subscribers<dyn Fn() + Send + Sync>,
}

impl Signal {
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::new(),
        }
    }

    pub fn subscribe(
        &self,
        callback: Callback,
    ) {
        self.subscribers.subscribe(callback);
    }

    /// Remove `callback`; returns false if it was not subscribed.
    pub fn unsubscribe(
        &self,
        callback: &Callback,
    ) -> bool {
        self.subscribers.unsubscribe(callback)
    }

    /// Invoke every current subscriber.
    pub fn emit(&self) {
        for callback in self.subscribers.snapshot() {
            callback();
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Signal {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Event with one payload argument.
pub struct Signal1<T> {
    subscribers: Subscribers<dyn Fn(T) + Send + Sync>,
}

impl<T: Clone> Signal1<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::new(),
        }
    }

    pub fn subscribe(
        &self,
        callback: Callback1<T>,
    ) {
        self.subscribers.subscribe(callback);
    }

    pub fn unsubscribe(
        &self,
        callback: &Callback1<T>,
    ) -> bool {
        self.subscribers.unsubscribe(callback)
    }

    pub fn emit(
        &self,
        value: T,
    ) {
        for callback in self.subscribers.snapshot() {
            callback(value.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone> Default for Signal1<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Event with two payload arguments.
pub struct Signal2<T, T2> {
    subscribers: Subscribers<dyn Fn(T, T2) + Send + Sync>,
}

impl<T: Clone, T2: Clone> Signal2<T, T2> {
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::new(),
        }
    }

    pub fn subscribe(
        &self,
        callback: Callback2<T, T2>,
    ) {
        self.subscribers.subscribe(callback);
    }

    pub fn unsubscribe(
        &self,
        callback: &Callback2<T, T2>,
    ) -> bool {
        self.subscribers.unsubscribe(callback)
    }

    pub fn emit(
        &self,
        first: T,
        second: T2,
    ) {
        for callback in self.subscribers.snapshot() {
            callback(first.clone(), second.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone, T2: Clone> Default for Signal2<T, T2> {
    fn default() -> Self {
        Self::new()
    }
}
