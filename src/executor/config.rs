// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker pool configuration.

use std::time::Duration;

use super::ExecutorError;

/// What a pool does with work it has no room for.
///
/// Propagation does not depend on the policy: units are wrapped before the
/// pool decides anything, so a unit run on the caller or dropped carries the
/// same snapshot it would have carried on a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SaturationPolicy {
    /// Fail the submission with [`ExecutorError::Saturated`].
    #[default]
    Reject,
    /// Run the unit synchronously on the submitting thread.
    CallerRuns,
    /// Drop the unit. Its handle, if any, resolves to `Cancelled`.
    Discard,
    /// Drop the oldest queued unit and queue this one instead.
    DiscardOldest,
}

/// Sizing and behavior of a [`WorkerPool`](super::WorkerPool).
///
/// ```rust
/// use std::time::Duration;
/// use tracewise::{ExecutorConfig, SaturationPolicy};
///
/// let config = ExecutorConfig::default()
///     .core_workers(2)
///     .max_workers(4)
///     .queue_capacity(8)
///     .keep_alive(Duration::from_secs(5))
///     .saturation(SaturationPolicy::CallerRuns);
/// assert!(config.validate().is_ok());
/// assert!(ExecutorConfig::default().max_workers(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Workers kept alive even when idle.
    pub core_workers: usize,
    /// Upper bound on workers; the ones above `core_workers` exit after `keep_alive`.
    pub max_workers: usize,
    /// Units that may wait for a worker before the pool counts as saturated.
    pub queue_capacity: usize,
    pub keep_alive: Duration,
    /// Worker threads are named `<prefix><n>`, counting from 1.
    pub thread_name_prefix: String,
    pub saturation: SaturationPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_workers: 10,
            max_workers: 20,
            queue_capacity: 100,
            keep_alive: Duration::from_secs(60),
            thread_name_prefix: "async-executor-".to_string(),
            saturation: SaturationPolicy::Reject,
        }
    }
}

impl ExecutorConfig {
    pub fn core_workers(mut self, n: usize) -> Self {
        self.core_workers = n;
        self
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.queue_capacity = n;
        self
    }

    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn saturation(mut self, policy: SaturationPolicy) -> Self {
        self.saturation = policy;
        self
    }

    /// Checks that the configuration describes a pool that can run work.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        if self.max_workers == 0 {
            return Err(ExecutorError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.core_workers > self.max_workers {
            return Err(ExecutorError::InvalidConfig(format!(
                "core_workers ({}) exceeds max_workers ({})",
                self.core_workers, self.max_workers
            )));
        }
        Ok(())
    }
}
