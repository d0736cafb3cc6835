// SPDX-License-Identifier: MIT OR Apache-2.0

//! Async context preservation.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use futures::FutureExt;

use crate::context::{ContextStore, Snapshot};
use crate::executor::{Executor, ExecutorError, TaskHandle};

use super::{Propagator, RestoreGuard};

/// A [`Future`] that polls its inner future with a snapshot installed.
///
/// Executors move futures between threads freely, so a context installed
/// before the first `.await` is not necessarily there at the second. Around
/// each poll, `WithContext`:
/// 1. saves the polling thread's context
/// 2. installs its snapshot
/// 3. polls the inner future
/// 4. restores the polling thread's context, also when the poll panics
///
/// Created by [`Propagator::scope`] and [`Propagator::scope_with`].
///
/// ```rust
/// use tracewise::Propagator;
/// use tracewise::context::{ContextStore, ThreadLocalStore};
///
/// async fn charge() -> Option<String> {
///     tracewise::context::current_trace_id()
/// }
///
/// # fn main() {
/// let propagator = Propagator::new();
/// ThreadLocalStore.put("traceId", "abc123");
/// let fut = propagator.scope(charge());
/// ThreadLocalStore.clear();
///
/// let seen = futures::executor::block_on(fut);
/// assert_eq!(seen.as_deref(), Some("abc123"));
/// assert!(ThreadLocalStore.get().is_absent());
/// # }
/// ```
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct WithContext<F, S> {
    snapshot: Snapshot,
    store: S,
    fut: F,
}

impl<F, S: ContextStore> WithContext<F, S> {
    pub(crate) fn new(fut: F, snapshot: Snapshot, store: S) -> Self {
        WithContext {
            snapshot,
            store,
            fut,
        }
    }

    /// The context the inner future is polled under.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn into_inner(self) -> F {
        self.fut
    }
}

impl<F, S> Future for WithContext<F, S>
where
    F: Future,
    S: ContextStore,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<Self::Output> {
        // SAFETY: `fut` is structurally pinned and never moved out of a pinned
        // `WithContext`; the other fields are only read.
        let (snapshot, store, fut) = unsafe {
            let d = self.get_unchecked_mut();
            (&d.snapshot, &d.store, Pin::new_unchecked(&mut d.fut))
        };
        let _restore = RestoreGuard::install(store, snapshot.clone());
        fut.poll(cx)
    }
}

impl<S: ContextStore> Propagator<S> {
    /// Polls `fut` under the calling path's current context.
    pub fn scope<F: Future>(&self, fut: F) -> WithContext<F, S> {
        WithContext::new(fut, self.capture(), self.store.clone())
    }

    /// Polls `fut` under `snapshot`.
    pub fn scope_with<F: Future>(&self, fut: F, snapshot: Snapshot) -> WithContext<F, S> {
        WithContext::new(fut, snapshot, self.store.clone())
    }

    /// Transforms the output of `fut`.
    ///
    /// `f` runs under the context captured *now*, not whatever context the
    /// thread that completes `fut` happens to have.
    pub fn map<Fut, G, T>(&self, fut: Fut, f: G) -> impl Future<Output = T> + use<S, Fut, G, T>
    where
        Fut: Future,
        G: FnOnce(Fut::Output) -> T,
    {
        let propagator = self.clone();
        let snapshot = self.capture();
        fut.map(move |value| propagator.run_with(&snapshot, || f(value)))
    }

    /// Chains an asynchronous stage after `fut`.
    ///
    /// Both `f` and the future it returns run under the context captured now.
    pub fn then<Fut, G, Next>(
        &self,
        fut: Fut,
        f: G,
    ) -> impl Future<Output = Next::Output> + use<S, Fut, G, Next>
    where
        Fut: Future,
        G: FnOnce(Fut::Output) -> Next,
        Next: Future,
    {
        let propagator = self.clone();
        let snapshot = self.capture();
        fut.then(move |value| {
            let next = propagator.run_with(&snapshot, || f(value));
            WithContext::new(next, snapshot, propagator.store)
        })
    }

    /// Consumes the output of `fut`.
    pub fn consume<Fut, G>(&self, fut: Fut, f: G) -> impl Future<Output = ()> + use<S, Fut, G>
    where
        Fut: Future,
        G: FnOnce(Fut::Output),
    {
        self.map(fut, f)
    }

    /// Observes the output of `fut` on completion and passes it through.
    ///
    /// Works for `Result` outputs as well, so it serves as a completion hook
    /// that sees both success and failure.
    pub fn inspect<Fut, G>(
        &self,
        fut: Fut,
        f: G,
    ) -> impl Future<Output = Fut::Output> + use<S, Fut, G>
    where
        Fut: Future,
        G: FnOnce(&Fut::Output),
    {
        self.map(fut, move |value| {
            f(&value);
            value
        })
    }

    /// Turns the error of a fallible `fut` into a value.
    ///
    /// `f` only runs on failure; successes pass through as they are.
    pub fn recover<Fut, G, T, E>(&self, fut: Fut, f: G) -> impl Future<Output = T> + use<S, Fut, G, T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        G: FnOnce(E) -> T,
    {
        self.map(fut, move |result| match result {
            Ok(value) => value,
            Err(error) => f(error),
        })
    }

    /// Drives `fut` to completion on one of `executor`'s workers, under the
    /// calling path's current context.
    ///
    /// The future is polled by a blocking loop on the worker, so it occupies
    /// that worker until it finishes.
    pub fn spawn<E, F>(&self, executor: &E, fut: F) -> Result<TaskHandle<F::Output>, ExecutorError>
    where
        E: Executor,
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let scoped = self.scope(fut);
        executor.submit(move || futures::executor::block_on(scoped))
    }
}
