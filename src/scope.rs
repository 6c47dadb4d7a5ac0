//! Pinned lifecycle scopes for thread-bound resources.
//!
//! A [`Scope`] pins the thread it is created on and tracks every resource
//! registered under it. Closing the scope unbinds the resources in reverse
//! registration order — most recently registered first, mirroring nested
//! acquisition — and then releases the pin. Explicit [`Scope::close`] is the
//! only sanctioned release path; nothing here depends on drop timing.

use std::fmt;

use tracing::warn;

use crate::error::{Error, Result};
use crate::pin::ThreadPin;

/// A resource whose lifetime is tied to a pinned [`Scope`].
///
/// `on_bind` runs synchronously when the resource is registered. `on_unbind`
/// runs when the owning scope closes, on the same pinned thread, before the
/// pin is released.
pub trait Bound {
    /// Called once at registration, while the scope is bound.
    fn on_bind(&mut self) {}

    /// Called once at scope close.
    ///
    /// # Errors
    ///
    /// A failure here aborts the rest of the close; see [`Scope::close`].
    fn on_unbind(&mut self) -> Result<()>;
}

/// A pinned lifecycle scope: an ordered registry of thread-bound resources.
///
/// Created on the thread it pins and unusable from any other (it holds a
/// [`ThreadPin`], which is `!Send`). Resources registered while the scope is
/// bound are exclusively owned by it and unbound in reverse registration
/// order at close.
///
/// Dropping a scope that was never closed releases the pin — the thread must
/// not stay locked — but runs no unbind callbacks, and warns if resources
/// were still registered: foreign teardown can fail and must be invoked
/// through the explicit, fallible [`close`](Scope::close).
pub struct Scope {
    pin: Option<ThreadPin>,
    resources: Vec<Box<dyn Bound>>,
}

impl Scope {
    /// Pin the current thread and open a fresh scope on it.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyPinned`] if the calling unit of work is
    /// already pinned, including from inside
    /// [`task::spawn_pinned`](crate::task::spawn_pinned); tasks that need a
    /// scope use [`with_scope`] or
    /// [`task::spawn_scoped`](crate::task::spawn_scoped) instead.
    pub fn enter() -> Result<Self> {
        let pin = ThreadPin::acquire()?;
        Ok(Self {
            pin: Some(pin),
            resources: Vec::new(),
        })
    }

    /// Whether this scope still holds its thread pin.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.pin.is_some()
    }

    /// Number of currently registered resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resources are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Register a resource, invoking its [`Bound::on_bind`] before
    /// returning. Ownership transfers to the scope.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotBound`] if the scope has already closed —
    /// registering after close is a use-after-close bug caught early.
    pub fn register(&mut self, mut resource: Box<dyn Bound>) -> Result<()> {
        if self.pin.is_none() {
            return Err(Error::NotBound);
        }
        resource.on_bind();
        self.resources.push(resource);
        Ok(())
    }

    /// Close the scope: unbind every resource in reverse registration order,
    /// then release the thread pin.
    ///
    /// Fail-fast: the first [`Bound::on_unbind`] error aborts the close.
    /// The failing resource has already been removed; earlier-registered
    /// resources stay bound and the scope stays pinned, so the caller may
    /// observe the failure and retry. Callers that need best-effort cleanup
    /// must register resources whose unbind cannot fail.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyClosed`] on a second close — a lifecycle
    /// contract violation, not a transient fault — or propagates the first
    /// unbind failure.
    pub fn close(&mut self) -> Result<()> {
        if self.pin.is_none() {
            return Err(Error::AlreadyClosed);
        }
        while let Some(mut resource) = self.resources.pop() {
            resource.on_unbind()?;
        }
        // All resources unbound; dropping the pin releases the thread.
        self.pin = None;
        Ok(())
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        if self.pin.is_some() && !self.resources.is_empty() {
            warn!(
                resources = self.resources.len(),
                "scope dropped while bound; resources were not unbound"
            );
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("bound", &self.is_bound())
            .field("resources", &self.resources.len())
            .finish()
    }
}

/// Run `task` on the current thread under a fresh pinned scope, closing the
/// scope on the way out.
///
/// If the task fails, the close is still attempted so the thread never stays
/// pinned; the task's error wins and a failing close is logged.
///
/// # Errors
///
/// Propagates [`Scope::enter`], the task's own error, or — when the task
/// succeeded — any [`Scope::close`] failure.
pub fn with_scope<R>(task: impl FnOnce(&mut Scope) -> Result<R>) -> Result<R> {
    let mut scope = Scope::enter()?;
    match task(&mut scope) {
        Ok(value) => {
            scope.close()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(close_err) = scope.close() {
                warn!(error = %close_err, "scope close failed after task error");
            }
            Err(err)
        }
    }
}
