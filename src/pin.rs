//! RAII pinning of a unit of work to its OS thread.

use std::cell::Cell;
use std::marker::PhantomData;

use crate::error::{Error, Result};

thread_local! {
    static PINNED: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current OS thread as the pinned home of one unit of work.
///
/// Foreign handles that carry thread affinity must only be touched while the
/// pin for their home thread is alive. Dropping the pin releases the thread
/// on every exit path, including unwinding. The pin is `!Send`: it can only
/// be released from the thread it pinned.
#[derive(Debug)]
pub struct ThreadPin {
    _not_send: PhantomData<*const ()>,
}

impl ThreadPin {
    /// Pin the current thread.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyPinned`] if a pin for this thread is
    /// already alive; a unit of work must never be pinned twice.
    pub fn acquire() -> Result<Self> {
        PINNED.with(|pinned| {
            if pinned.get() {
                return Err(Error::AlreadyPinned);
            }
            pinned.set(true);
            Ok(Self {
                _not_send: PhantomData,
            })
        })
    }

    /// Whether the current thread is pinned.
    #[must_use]
    pub fn is_pinned() -> bool {
        PINNED.with(Cell::get)
    }
}

impl Drop for ThreadPin {
    fn drop(&mut self) {
        PINNED.with(|pinned| pinned.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_exclusive_per_thread() {
        let pin = ThreadPin::acquire().expect("fresh thread");
        assert!(matches!(ThreadPin::acquire(), Err(Error::AlreadyPinned)));
        drop(pin);
        // Released on drop; the thread can be pinned again.
        assert!(ThreadPin::acquire().is_ok());
    }

    #[test]
    fn pins_are_per_thread() {
        let _pin = ThreadPin::acquire().expect("fresh thread");
        let other = std::thread::spawn(|| ThreadPin::acquire().is_ok())
            .join()
            .expect("thread");
        assert!(other);
    }

    #[test]
    fn released_on_unwind() {
        let _ = std::panic::catch_unwind(|| {
            let _pin = ThreadPin::acquire().expect("fresh thread");
            panic!("boom");
        });
        assert!(!ThreadPin::is_pinned());
    }
}
