// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task and callable wrappers.

use crate::context::{ContextStore, Snapshot};

use super::Propagator;

/// A unit of work bundled with the context it was created under.
///
/// Created by [`Propagator::wrap`] or [`Propagator::wrap_with`]. The same type
/// covers procedures (`FnOnce()`), value-returning closures (`FnOnce() -> T`)
/// and fallible ones (`FnOnce() -> Result<T, E>`): running it consumes the
/// wrapper, so it runs at most once.
///
/// ```rust
/// use tracewise::Propagator;
/// use tracewise::context::{ContextStore, ThreadLocalStore};
///
/// let propagator = Propagator::new();
/// ThreadLocalStore.put("traceId", "caller");
/// let job = propagator.wrap(|| -> Result<u32, String> {
///     Err(format!("failed under {:?}", tracewise::context::current_trace_id()))
/// });
///
/// let result = std::thread::spawn(move || {
///     ThreadLocalStore.put("traceId", "worker");
///     let result = job.call();
///     // the worker got its own context back
///     assert_eq!(tracewise::context::current_trace_id().as_deref(), Some("worker"));
///     result
/// })
/// .join()
/// .unwrap();
/// assert_eq!(result, Err("failed under Some(\"caller\")".to_string()));
/// # ThreadLocalStore.clear();
/// ```
#[must_use = "a wrapped unit does nothing until it is run"]
pub struct Propagating<F, S> {
    unit: F,
    snapshot: Snapshot,
    store: S,
}

impl<F, S: ContextStore> Propagating<F, S> {
    pub(crate) fn new(unit: F, snapshot: Snapshot, store: S) -> Self {
        Propagating {
            unit,
            snapshot,
            store,
        }
    }

    /// The context the unit will run under.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Runs a value-returning unit under the captured context.
    pub fn call<R>(self) -> R
    where
        F: FnOnce() -> R,
    {
        let Propagating {
            unit,
            snapshot,
            store,
        } = self;
        Propagator::with_store(store).run_with(&snapshot, unit)
    }

    /// Runs a procedure under the captured context.
    pub fn run(self)
    where
        F: FnOnce(),
    {
        self.call()
    }

    /// The wrapper as a boxed closure, for APIs that take plain jobs.
    pub fn into_job<R>(self) -> Box<dyn FnOnce() -> R + Send>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        Box::new(move || self.call())
    }
}

impl<F, S: std::fmt::Debug> std::fmt::Debug for Propagating<F, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propagating")
            .field("snapshot", &self.snapshot)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
