#![doc = include_str!("../README.md")]

pub mod error;
pub mod guard;
pub mod pin;
pub mod scope;
pub mod shared;
pub mod signal;
pub mod task;

// Re-export core public API at crate root.
pub use error::{Error, Result};
pub use guard::Closeable;
pub use pin::ThreadPin;
pub use scope::{Bound, Scope, with_scope};
pub use shared::{ReleaseTask, SharedRef};
pub use task::{Builder, spawn_pinned, spawn_scoped, spawn_signaling};
