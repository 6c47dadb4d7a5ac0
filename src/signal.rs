//! Foreign signal capture and classification.
//!
//! A foreign signal is a thread-local numeric error code set by the last
//! foreign call and valid only until the next one on that thread. Capture
//! must therefore happen immediately after the triggering call, on the same
//! pinned thread, with no foreign call in between — a precondition the
//! caller upholds and this module cannot check. The signal source is always
//! passed in as a value rather than read from process-global state, so tests
//! can substitute a fake foreign layer.

use crate::error::{Error, Result};

/// The sentinel raw signal meaning "no error".
pub const NO_SIGNAL: i32 = 0;

/// Read and classify the current foreign signal.
///
/// A sentinel signal is success. A nonzero signal is passed through
/// `classifier`; if that yields nothing, the raw code surfaces as
/// [`Error::UnexpectedSignal`] — unmapped signals are never silently
/// swallowed.
///
/// # Errors
///
/// Whatever `classifier` yields for the raw signal, or
/// [`Error::UnexpectedSignal`] wrapping it.
pub fn capture(
    read_signal: impl FnOnce() -> i32,
    classifier: impl FnOnce(i32) -> Option<Error>,
) -> Result<()> {
    let raw = read_signal();
    if raw == NO_SIGNAL {
        return Ok(());
    }
    match classifier(raw) {
        Some(err) => Err(err),
        None => Err(Error::UnexpectedSignal(raw)),
    }
}

/// Capture only when `cond` holds.
///
/// The hot success path — the triggering call already reported success —
/// skips the foreign read entirely.
///
/// # Errors
///
/// As [`capture`], when `cond` is true.
pub fn capture_if(
    cond: bool,
    read_signal: impl FnOnce() -> i32,
    classifier: impl FnOnce(i32) -> Option<Error>,
) -> Result<()> {
    if cond {
        capture(read_signal, classifier)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn invalid_argument_only(raw: i32) -> Option<Error> {
        (raw == 4).then(|| Error::Foreign("invalid argument".into()))
    }

    #[test]
    fn sentinel_is_success() {
        assert!(capture(|| 0, invalid_argument_only).is_ok());
    }

    #[test]
    fn mapped_signal_is_classified() {
        let err = capture(|| 4, invalid_argument_only);
        assert!(matches!(err, Err(Error::Foreign(m)) if m == "invalid argument"));
    }

    #[test]
    fn unmapped_signal_falls_back() {
        let err = capture(|| 99, invalid_argument_only);
        assert!(matches!(err, Err(Error::UnexpectedSignal(99))));
    }

    #[test]
    fn every_signal_yields_an_outcome() {
        // Totality: success, classified, or fallback — never nothing.
        for raw in [-7, 0, 1, 4, 99, i32::MAX] {
            let out = capture(|| raw, invalid_argument_only);
            match raw {
                0 => assert!(out.is_ok()),
                4 => assert!(matches!(out, Err(Error::Foreign(_)))),
                _ => assert!(matches!(out, Err(Error::UnexpectedSignal(r)) if r == raw)),
            }
        }
    }

    #[test]
    fn conditional_capture_skips_the_read() {
        let read = Cell::new(false);
        let out = capture_if(
            false,
            || {
                read.set(true);
                4
            },
            invalid_argument_only,
        );
        assert!(out.is_ok());
        assert!(!read.get(), "success path must not touch the foreign layer");

        let out = capture_if(true, || 4, invalid_argument_only);
        assert!(matches!(out, Err(Error::Foreign(_))));
    }
}
