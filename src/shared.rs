//! Reference-counted shutdown: one release action, many independent owners.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::error;

use crate::error::{Error, Result};
use crate::task;

/// The deferred release action. Consumed at most once; runs on its own
/// pinned thread when the last reference is dropped.
pub type ReleaseTask = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

/// Thread name for detached release tasks.
const RELEASE_THREAD: &str = "tether-release";

/// Coordinates multiple independent owners of one shared resource.
///
/// Each owner calls [`decrement`](SharedRef::decrement) exactly once when it
/// is done; whichever owner turns out to be last triggers the release
/// action, executed as a freshly pinned unit of work. No owner needs to know
/// it was last. A counter that has reached zero is exhausted for good —
/// there is no path back from fully-released to referenced.
pub struct SharedRef {
    state: Mutex<State>,
}

struct State {
    count: usize,
    release: Option<ReleaseTask>,
}

impl SharedRef {
    /// Create a counter with `initial` known owners.
    ///
    /// `initial == 0` is the degenerate "no real owners, release now"
    /// configuration: the release runs immediately on its own pinned thread
    /// and the counter is born exhausted.
    ///
    /// # Errors
    ///
    /// With `initial == 0`, fails with [`Error::Spawn`] if the release
    /// thread cannot be spawned.
    pub fn new(initial: usize, release: ReleaseTask) -> Result<Self> {
        let release = if initial == 0 {
            launch(release)?;
            None
        } else {
            Some(release)
        };
        Ok(Self {
            state: Mutex::new(State {
                count: initial,
                release,
            }),
        })
    }

    /// Add an owner.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CounterExhausted`] once the count has reached
    /// zero: acquiring a reference to something already gone is a logic
    /// error, and an exhausted counter can never be revived.
    pub fn increment(&self) -> Result<()> {
        let mut state = self.lock();
        if state.count == 0 {
            return Err(Error::CounterExhausted);
        }
        state.count += 1;
        Ok(())
    }

    /// Drop one owner's reference.
    ///
    /// The owner that drives the count to zero triggers the release action
    /// on a fresh pinned thread — never inline, and never under this
    /// counter's lock. The call itself does not block on the release.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CounterExhausted`] if the count is already zero
    /// (a double-decrement would mean the release could run twice), or with
    /// [`Error::Spawn`] if the release thread cannot be spawned.
    pub fn decrement(&self) -> Result<()> {
        let release = {
            let mut state = self.lock();
            match state.count {
                0 => return Err(Error::CounterExhausted),
                1 => {
                    state.count = 0;
                    state.release.take()
                }
                _ => {
                    state.count -= 1;
                    None
                }
            }
        };
        match release {
            Some(task) => launch(task),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SharedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("SharedRef")
            .field("count", &state.count)
            .field("release_pending", &state.release.is_some())
            .finish()
    }
}

/// Spawn `release` as a detached pinned task. A failure of the task itself
/// is logged rather than propagated — the last owner has already moved on
/// and nobody is left to receive it.
fn launch(release: ReleaseTask) -> Result<()> {
    let _detached = task::Builder::new().name(RELEASE_THREAD).spawn(move || {
        release().inspect_err(|err| error!(error = %err, "release action failed"))
    })?;
    Ok(())
}
