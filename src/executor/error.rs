// SPDX-License-Identifier: MIT OR Apache-2.0

//! Executor errors.

use std::any::Any;

use thiserror::Error;

/// Why an executor did not accept a unit of work.
///
/// None of these is fatal to the executor: a saturated pool accepts work
/// again as soon as a worker frees up.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The executor was shut down; it never accepts work again.
    #[error("executor has been shut down")]
    ShutDown,

    /// Queue and workers are at capacity and the policy is to reject.
    #[error("executor saturated ({queued} queued, {workers} workers)")]
    Saturated { queued: usize, workers: usize },

    /// An [`ExecutorConfig`](super::ExecutorConfig) that cannot describe a pool.
    #[error("invalid executor configuration: {0}")]
    InvalidConfig(String),

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Why a [`TaskHandle`](super::TaskHandle) did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// The task panicked. Holds the panic message when it was a string.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The task was dropped before it ran, by `shutdown_now` or a discarding
    /// saturation policy, or its outcome was already taken.
    #[error("task was cancelled before it completed")]
    Cancelled,

    /// A bounded join gave up waiting. The task itself keeps running.
    #[error("timed out waiting for task")]
    Timeout,
}

impl JoinError {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        JoinError::Panicked(panic_message(payload.as_ref()))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
