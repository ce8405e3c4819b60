//! Deferred computations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::contracts::{BlockingDereference, Dereference};

type Thunk<T> = Box<dyn FnOnce() -> T + Send>;

struct Shared<T> {
    value: Lazy<T, Thunk<T>>,
    // Held while the thunk runs, so timed waiters can give up.
    forcing: Mutex<()>,
}

/// A value computed at most once, the first time it is dereferenced.
///
/// Clones share the same cell, so the thunk runs once across all of them
/// and from any thread.
pub struct Delay<T> {
    cell: Arc<Shared<T>>,
}

impl<T> Delay<T> {
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let thunk: Thunk<T> = Box::new(thunk);
        Delay {
            cell: Arc::new(Shared {
                value: Lazy::new(thunk),
                forcing: Mutex::new(()),
            }),
        }
    }

    /// Whether the thunk has already run.
    pub fn is_realized(&self) -> bool {
        Lazy::get(&self.cell.value).is_some()
    }
}

impl<T> Dereference for Delay<T> {
    type Target = T;

    fn deref(&self) -> &T {
        if let Some(value) = Lazy::get(&self.cell.value) {
            return value;
        }
        let _forcing = self.cell.forcing.lock();
        Lazy::force(&self.cell.value)
    }
}

impl<T> BlockingDereference for Delay<T> {
    /// Waits at most `timeout` for another thread that is already running
    /// the thunk. An unstarted thunk runs on the calling thread.
    fn deref_timeout<'a>(&'a self, timeout: Duration, timeout_value: &'a T) -> &'a T {
        if let Some(value) = Lazy::get(&self.cell.value) {
            return value;
        }
        match self.cell.forcing.try_lock_for(timeout) {
            Some(_forcing) => Lazy::force(&self.cell.value),
            None => Lazy::get(&self.cell.value).unwrap_or(timeout_value),
        }
    }
}

impl<T> Clone for Delay<T> {
    fn clone(&self) -> Self {
        Delay {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Delay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Lazy::get(&self.cell.value) {
            Some(value) => f.debug_tuple("Delay").field(value).finish(),
            None => f.write_str("Delay(<pending>)"),
        }
    }
}
