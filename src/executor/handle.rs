// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result handles for submitted tasks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread::Thread;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::channel::oneshot;
use futures::task::ArcWake;

use super::JoinError;

type Outcome<T> = Result<T, JoinError>;

/// The eventual outcome of a submitted task.
///
/// A handle can be joined from a thread with [`join`](Self::join), or awaited
/// as a [`Future`], which makes it a valid input to the combinators on
/// [`Propagator`](crate::Propagator). A panic in the task becomes
/// [`JoinError::Panicked`]; a task dropped before it ran becomes
/// [`JoinError::Cancelled`].
///
/// The outcome is handed out once. Asking again reports `Cancelled`.
pub struct TaskHandle<T> {
    receiver: oneshot::Receiver<Outcome<T>>,
    /// Taken off the channel by `is_finished`, not yet handed out.
    outcome: Option<Outcome<T>>,
}

/// The task side of a [`TaskHandle`].
///
/// Dropping it without completing cancels the handle, which is how queued
/// tasks dropped by a shutdown or a discarding policy resolve their handles.
pub(crate) struct Completer<T>(oneshot::Sender<Outcome<T>>);

pub(crate) fn pair<T>() -> (TaskHandle<T>, Completer<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        TaskHandle {
            receiver,
            outcome: None,
        },
        Completer(sender),
    )
}

impl<T> Completer<T> {
    pub(crate) fn complete(self, outcome: Outcome<T>) {
        // the handle may already be gone
        let _ = self.0.send(outcome);
    }
}

/// Wakes a thread parked in [`TaskHandle::join`].
struct Unpark(Thread);

impl ArcWake for Unpark {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.unpark();
    }
}

impl<T> TaskHandle<T> {
    /// Blocks until the task finishes.
    pub fn join(mut self) -> Result<T, JoinError> {
        self.block_until(None)
    }

    /// Blocks until the task finishes or `timeout` elapses.
    ///
    /// On [`JoinError::Timeout`] the handle stays valid and can be joined again.
    /// A timeout too large to represent waits without a deadline.
    pub fn join_timeout(&mut self, timeout: Duration) -> Result<T, JoinError> {
        self.block_until(Instant::now().checked_add(timeout))
    }

    /// Whether the outcome is available without blocking.
    pub fn is_finished(&mut self) -> bool {
        if self.outcome.is_none() {
            match self.receiver.try_recv() {
                Ok(Some(outcome)) => self.outcome = Some(outcome),
                Ok(None) => return false,
                Err(oneshot::Canceled) => self.outcome = Some(Err(JoinError::Cancelled)),
            }
        }
        true
    }

    fn block_until(&mut self, deadline: Option<Instant>) -> Result<T, JoinError> {
        let waker = futures::task::waker(Arc::new(Unpark(std::thread::current())));
        let mut cx = Context::from_waker(&waker);
        loop {
            if let Poll::Ready(outcome) = self.poll_unpin(&mut cx) {
                return outcome;
            }
            match deadline {
                None => std::thread::park(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(JoinError::Timeout);
                    }
                    std::thread::park_timeout(deadline - now);
                }
            }
        }
    }
}

// `T` is only ever moved out, never pinned.
impl<T> Unpin for TaskHandle<T> {}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = this.outcome.take() {
            return Poll::Ready(outcome);
        }
        this.receiver
            .poll_unpin(cx)
            .map(|received| received.unwrap_or(Err(JoinError::Cancelled)))
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("outcome_buffered", &self.outcome.is_some())
            .finish_non_exhaustive()
    }
}
