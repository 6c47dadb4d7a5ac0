//! Pinned task execution primitives.
//!
//! Every spawner here dedicates a freshly spawned OS thread to the task and
//! keeps it pinned for the task's whole duration, so foreign calls made
//! inside the task observe a stable thread identity. Spawning never blocks
//! the caller; join the returned handle to observe the outcome, or drop it
//! for fire-and-forget execution.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::pin::ThreadPin;
use crate::scope::{self, Scope};

/// Default name for pinned worker threads.
const THREAD_NAME: &str = "tether-pinned";

/// Run `task` pinned to a fresh OS thread.
///
/// # Errors
///
/// Fails with [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a new
/// thread.
pub fn spawn_pinned<F>(task: F) -> Result<JoinHandle<Result<()>>>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    Builder::new().spawn(task)
}

/// Run `task` pinned to a fresh OS thread, then send `msg` on `tx`.
///
/// The message is sent after the task completes and its pin is released —
/// even if the task fails or panics — so a caller blocked on the channel
/// always wakes.
///
/// # Errors
///
/// Fails with [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a new
/// thread.
pub fn spawn_signaling<F, M>(task: F, tx: mpsc::Sender<M>, msg: M) -> Result<JoinHandle<Result<()>>>
where
    F: FnOnce() -> Result<()> + Send + 'static,
    M: Send + 'static,
{
    Builder::new().spawn_signaling(task, tx, msg)
}

/// Run `task` on a fresh OS thread under a pinned [`Scope`], closing the
/// scope on the way out.
///
/// # Errors
///
/// Fails with [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a new
/// thread.
pub fn spawn_scoped<F>(task: F) -> Result<JoinHandle<Result<()>>>
where
    F: FnOnce(&mut Scope) -> Result<()> + Send + 'static,
{
    Builder::new().spawn_scoped(task)
}

/// Configures pinned worker threads before spawning.
///
/// Mirrors [`std::thread::Builder`], with pinning applied inside the spawned
/// thread.
#[derive(Debug, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    /// A builder with the default thread name and stack size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the spawned thread (default: `tether-pinned`).
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the spawned thread's stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Spawn `task` pinned to the new thread.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a
    /// new thread.
    pub fn spawn<F>(self, task: F) -> Result<JoinHandle<Result<()>>>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let handle = self.os_builder().spawn(move || {
            let _pin = ThreadPin::acquire()?;
            task()
        })?;
        Ok(handle)
    }

    /// Spawn `task` pinned to the new thread; send `msg` on `tx` once the
    /// task has completed and the pin is released, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a
    /// new thread.
    pub fn spawn_signaling<F, M>(
        self,
        task: F,
        tx: mpsc::Sender<M>,
        msg: M,
    ) -> Result<JoinHandle<Result<()>>>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
        M: Send + 'static,
    {
        let handle = self.os_builder().spawn(move || {
            // Declared before the pin so it drops after the pin is released.
            let _signal = SendOnDrop { tx, msg: Some(msg) };
            let _pin = ThreadPin::acquire()?;
            task()
        })?;
        Ok(handle)
    }

    /// Spawn `task` on the new thread under a pinned [`Scope`].
    ///
    /// The scope owns the pin here; see [`scope::with_scope`].
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Spawn`](crate::Error::Spawn) if the OS refuses a
    /// new thread.
    pub fn spawn_scoped<F>(self, task: F) -> Result<JoinHandle<Result<()>>>
    where
        F: FnOnce(&mut Scope) -> Result<()> + Send + 'static,
    {
        let handle = self.os_builder().spawn(move || scope::with_scope(task))?;
        Ok(handle)
    }

    fn os_builder(self) -> thread::Builder {
        let mut builder =
            thread::Builder::new().name(self.name.unwrap_or_else(|| THREAD_NAME.into()));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder
    }
}

/// Sends its message when dropped, surviving panics in the task body.
struct SendOnDrop<M> {
    tx: mpsc::Sender<M>,
    msg: Option<M>,
}

impl<M> Drop for SendOnDrop<M> {
    fn drop(&mut self) {
        if let Some(msg) = self.msg.take() {
            let _ = self.tx.send(msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn spawned_task_runs_pinned() {
        let handle = spawn_pinned(|| {
            assert!(ThreadPin::is_pinned());
            // The unit of work is already pinned; pinning again is an error.
            assert!(matches!(ThreadPin::acquire(), Err(Error::AlreadyPinned)));
            Ok(())
        })
        .expect("spawn");
        handle.join().expect("join").expect("task");
    }

    #[test]
    fn signaling_sends_on_success() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_signaling(|| Ok(()), tx, "done").expect("spawn");
        assert_eq!(rx.recv().expect("signal"), "done");
        handle.join().expect("join").expect("task");
    }

    #[test]
    fn signaling_sends_on_task_error() {
        let (tx, rx) = mpsc::channel();
        let handle =
            spawn_signaling(|| Err(Error::Foreign("send failed".into())), tx, ()).expect("spawn");
        rx.recv().expect("signal despite failure");
        assert!(handle.join().expect("join").is_err());
    }

    #[test]
    fn signaling_sends_on_panic() {
        let (tx, rx) = mpsc::channel();
        let handle = spawn_signaling(|| panic!("task body panicked"), tx, 7u32).expect("spawn");
        assert_eq!(rx.recv().expect("signal despite panic"), 7);
        assert!(handle.join().is_err());
    }

    #[test]
    fn builder_names_the_thread() {
        let handle = Builder::new()
            .name("tether-test-worker")
            .spawn(|| {
                assert_eq!(
                    std::thread::current().name(),
                    Some("tether-test-worker"),
                    "pinned thread should carry the configured name"
                );
                Ok(())
            })
            .expect("spawn");
        handle.join().expect("join").expect("task");
    }
}
