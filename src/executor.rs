// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pools that carry context into the work they run.
//!
//! [`WorkerPool`] is a plain bounded thread pool. [`PropagatingExecutor`]
//! decorates any [`Executor`] so that every unit it accepts is wrapped with
//! the submitting path's context *at submission time*: a unit submitted under
//! request A and started after the submitter moved on to request B still runs
//! under A.
//!
//! ```rust
//! use tracewise::{Executor, ExecutorConfig, PropagatingExecutor, WorkerPool};
//! use tracewise::context::{ContextStore, ThreadLocalStore};
//!
//! let executor = PropagatingExecutor::new(WorkerPool::new(ExecutorConfig::default()).unwrap());
//! ThreadLocalStore.put("traceId", "abc123");
//! let handle = executor.submit(tracewise::context::current_trace_id).unwrap();
//! ThreadLocalStore.put("traceId", "something-else");
//!
//! assert_eq!(handle.join().unwrap().as_deref(), Some("abc123"));
//! # ThreadLocalStore.clear();
//! ```

mod config;
mod error;
mod handle;
mod pool;


use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub use config::{ExecutorConfig, SaturationPolicy};
pub use error::{ExecutorError, JoinError};
pub use handle::TaskHandle;
pub use pool::WorkerPool;

use crate::Propagator;
use crate::context::{ContextStore, ThreadLocalStore};

/// A unit of work as executors see it.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that runs jobs, on this thread or another.
pub trait Executor: Send + Sync {
    /// Accepts `job` for execution, or says why not.
    fn execute_job(&self, job: Job) -> Result<(), ExecutorError>;

    /// Fire-and-forget execution of a procedure.
    fn execute<F>(&self, f: F) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
        Self: Sized,
    {
        self.execute_job(Box::new(f))
    }

    /// Executes a value-returning unit and hands back its outcome.
    ///
    /// A panic in `f` is caught and reported through the handle as
    /// [`JoinError::Panicked`]. Fallible units simply return their `Result`,
    /// which the handle passes through untouched.
    fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>, ExecutorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
        Self: Sized,
    {
        let (handle, completer) = handle::pair();
        self.execute_job(Box::new(move || {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(f)).map_err(JoinError::from_panic);
            completer.complete(outcome);
        }))?;
        Ok(handle)
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute_job(&self, job: Job) -> Result<(), ExecutorError> {
        (**self).execute_job(job)
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute_job(&self, job: Job) -> Result<(), ExecutorError> {
        (**self).execute_job(job)
    }
}

/// An executor that captures the submitter's context for every unit.
///
/// Capture happens in the submitting call, before the inner executor queues,
/// starts, runs inline or discards the unit, so the saturation policy never
/// changes which context a unit sees.
#[derive(Debug)]
pub struct PropagatingExecutor<E = WorkerPool, S = ThreadLocalStore> {
    inner: E,
    propagator: Propagator<S>,
}

impl<E: Executor> PropagatingExecutor<E, ThreadLocalStore> {
    pub fn new(inner: E) -> Self {
        PropagatingExecutor {
            inner,
            propagator: Propagator::new(),
        }
    }
}

impl<E: Executor, S: ContextStore> PropagatingExecutor<E, S> {
    pub fn with_propagator(inner: E, propagator: Propagator<S>) -> Self {
        PropagatingExecutor { inner, propagator }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn propagator(&self) -> &Propagator<S> {
        &self.propagator
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl PropagatingExecutor<WorkerPool, ThreadLocalStore> {
    /// A propagating executor over a fresh [`WorkerPool`].
    pub fn with_config(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        Ok(Self::new(WorkerPool::new(config)?))
    }
}

impl<E: Executor, S: ContextStore> Executor for PropagatingExecutor<E, S> {
    fn execute_job(&self, job: Job) -> Result<(), ExecutorError> {
        self.inner.execute_job(self.propagator.wrap(job).into_job())
    }

    fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>, ExecutorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
        Self: Sized,
    {
        // Wrapped inside the panic boundary, so the worker's context is back
        // in place before the handle resolves.
        let wrapped = self.propagator.wrap(f);
        let (handle, completer) = handle::pair();
        self.inner.execute_job(Box::new(move || {
            let outcome =
                std::panic::catch_unwind(AssertUnwindSafe(|| wrapped.call())).map_err(JoinError::from_panic);
            completer.complete(outcome);
        }))?;
        Ok(handle)
    }
}

impl<S: ContextStore> std::ops::Deref for PropagatingExecutor<WorkerPool, S> {
    type Target = WorkerPool;

    fn deref(&self) -> &WorkerPool {
        &self.inner
    }
}
