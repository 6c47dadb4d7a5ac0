//! Open/closed state guard for resources shared between threads.

use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};

/// A one-way open-to-closed state machine.
///
/// The foreign layer does not guarantee that destroying a handle twice is
/// safe; this guard is what makes close idempotent from the caller's side,
/// and rejects use-after-close. The state is never readable on its own —
/// every check-then-act call site goes through [`when`](Closeable::when) or
/// [`close_with`](Closeable::close_with), so there is no window between
/// observing "open" and acting on it.
#[derive(Debug)]
pub struct Closeable {
    open: Mutex<bool>,
}

impl Closeable {
    /// A fresh guard in the open state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            open: Mutex::new(true),
        }
    }

    /// If the current state matches `expected_open`, run `act` while still
    /// holding the state lock and return its result; otherwise return `None`
    /// without running it.
    ///
    /// `act` runs under the guard's mutex: it must cover only the use of the
    /// guarded resource, never a foreign call that can block.
    pub fn when<R>(&self, expected_open: bool, act: impl FnOnce() -> R) -> Option<R> {
        let open = self.lock();
        if *open == expected_open {
            Some(act())
        } else {
            None
        }
    }

    /// Close the guard, running `teardown` under the lock.
    ///
    /// The state flips to closed *before* the teardown runs, so a failing
    /// teardown can never run twice: close is at-most-once even when the
    /// foreign release call reports an error.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyClosed`] if the guard was already closed;
    /// only one concurrent closer can ever observe the open state. Otherwise
    /// propagates `teardown`'s own error.
    pub fn close_with<R>(&self, teardown: impl FnOnce() -> Result<R>) -> Result<R> {
        let mut open = self.lock();
        if !*open {
            return Err(Error::AlreadyClosed);
        }
        *open = false;
        teardown()
    }

    /// Close the guard with no teardown action.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyClosed`] if the guard was already closed.
    pub fn close(&self) -> Result<()> {
        self.close_with(|| Ok(()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, bool> {
        // A poisoned flag is still a valid flag; the one-way invariant holds.
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Closeable {
    fn default() -> Self {
        Self::new()
    }
}
