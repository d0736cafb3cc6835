// SPDX-License-Identifier: MIT OR Apache-2.0

//! Carrying context across concurrency boundaries.
//!
//! Everything in this module is built on one primitive,
//! [`Propagator::run_with`]: save the ambient context of the executing path,
//! install a snapshot, run the unit of work, and restore the ambient context
//! no matter how the unit finished. The adapters differ only in *when* they
//! capture the snapshot:
//!
//! - [`Propagator::wrap`] captures when the closure is wrapped
//! - [`PropagatingExecutor`](crate::PropagatingExecutor) captures when the task is submitted
//! - [`Propagator::map`] and the other combinators capture when the continuation is attached
//!
//! Capture always happens on the path that creates the work, never on the
//! path that later runs it.
//!
//! ```rust
//! use tracewise::Propagator;
//! use tracewise::context::{ContextStore, ThreadLocalStore};
//!
//! let propagator = Propagator::new();
//! ThreadLocalStore.put("traceId", "abc123");
//! let task = propagator.wrap(|| tracewise::context::current_trace_id());
//! ThreadLocalStore.put("traceId", "changed-later");
//!
//! let seen = std::thread::spawn(move || task.call()).join().unwrap();
//! assert_eq!(seen.as_deref(), Some("abc123"));
//! # ThreadLocalStore.clear();
//! ```

mod future;
mod wrapper;


pub use future::WithContext;
pub use wrapper::Propagating;

use crate::context::{ContextStore, Snapshot, ThreadLocalStore};

/// Handle through which work captures and re-installs context.
///
/// Cheap to clone; hand one to every component that creates work for other
/// threads. The store type defaults to [`ThreadLocalStore`].
#[derive(Debug, Clone, Default)]
pub struct Propagator<S = ThreadLocalStore> {
    store: S,
}

impl Propagator<ThreadLocalStore> {
    /// A propagator over the thread-local store.
    pub fn new() -> Self {
        Propagator {
            store: ThreadLocalStore,
        }
    }
}

impl<S: ContextStore> Propagator<S> {
    /// A propagator over a caller-supplied store.
    pub fn with_store(store: S) -> Self {
        Propagator { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The calling path's context, for forwarding with [`wrap_with`](Self::wrap_with)
    /// or [`scope_with`](Self::scope_with).
    #[inline]
    pub fn capture(&self) -> Snapshot {
        self.store.get()
    }

    /// Runs `f` with `snapshot` installed, then restores whatever context the
    /// calling path had before.
    ///
    /// The restore is a true restore, not a clear, and it also happens while a
    /// panic from `f` unwinds. Whatever `f` returns, including an `Err`, is
    /// passed through untouched.
    pub fn run_with<R>(&self, snapshot: &Snapshot, f: impl FnOnce() -> R) -> R {
        let _restore = RestoreGuard::install(&self.store, snapshot.clone());
        f()
    }

    /// Wraps `unit` with the calling path's current context.
    pub fn wrap<F>(&self, unit: F) -> Propagating<F, S> {
        Propagating::new(unit, self.capture(), self.store.clone())
    }

    /// Wraps `unit` with a snapshot the caller already holds.
    pub fn wrap_with<F>(&self, unit: F, snapshot: Snapshot) -> Propagating<F, S> {
        Propagating::new(unit, snapshot, self.store.clone())
    }
}

/// Restores a path's previous context when dropped.
///
/// Created by [`RestoreGuard::install`], which swaps a snapshot in. Holding
/// the guard across a unit of work is what makes restoration unconditional.
#[must_use = "the previous context is restored when the guard is dropped"]
#[derive(Debug)]
pub struct RestoreGuard<'a, S: ContextStore> {
    store: &'a S,
    previous: Option<Snapshot>,
}

impl<'a, S: ContextStore> RestoreGuard<'a, S> {
    /// Installs `snapshot` on `store`, remembering what was there.
    pub fn install(store: &'a S, snapshot: Snapshot) -> Self {
        let previous = store.get();
        store.set(snapshot);
        RestoreGuard {
            store,
            previous: Some(previous),
        }
    }

    /// The ambient context that will be restored.
    pub fn previous(&self) -> &Snapshot {
        // only taken in drop
        self.previous.as_ref().unwrap_or(&ABSENT)
    }
}

static ABSENT: Snapshot = Snapshot::absent();

impl<S: ContextStore> Drop for RestoreGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.store.set(previous);
        }
    }
}
