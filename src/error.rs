//! Unified error types for the lifecycle coordination core.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
///
/// The first four variants are lifecycle contract violations: the caller
/// used a resource after its owner released it, released twice, or pinned
/// twice. They signal logic errors and are never worth retrying. The foreign
/// variants carry failures of the underlying native layer and propagate as
/// ordinary recoverable errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The current thread is already pinned to a unit of work.
    #[error("thread is already pinned")]
    AlreadyPinned,

    /// A resource was registered on a scope that is no longer bound.
    #[error("scope is not bound")]
    NotBound,

    /// A scope or closeable guard was closed a second time.
    #[error("already closed")]
    AlreadyClosed,

    /// Increment or decrement on a reference counter already at zero.
    #[error("reference counter exhausted")]
    CounterExhausted,

    /// A classified failure reported by the foreign layer.
    #[error("foreign: {0}")]
    Foreign(String),

    /// A nonzero foreign signal with no mapping in the classifier.
    #[error("unexpected foreign signal {0}")]
    UnexpectedSignal(i32),

    /// OS thread acquisition failed.
    #[error("spawn: {0}")]
    Spawn(#[from] io::Error),
}
