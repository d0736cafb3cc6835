// SPDX-License-Identifier: MIT OR Apache-2.0

//! A bounded pool of worker threads.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::error::panic_message;
use super::{Executor, ExecutorConfig, ExecutorError, Job, SaturationPolicy};

struct PoolState {
    queue: VecDeque<Job>,
    /// Live worker threads, including ones being started.
    workers: usize,
    /// Workers blocked waiting for a job.
    idle: usize,
    /// Workers running a job.
    active: usize,
    completed: u64,
    shut_down: bool,
}

struct PoolShared {
    config: ExecutorConfig,
    state: Mutex<PoolState>,
    work_available: Condvar,
    terminated: Condvar,
    next_thread: AtomicUsize,
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A bounded pool of worker threads.
///
/// Submission follows the usual bounded-pool order:
/// 1. with fewer than `core_workers` workers, start a new one for the job
/// 2. otherwise queue the job while the queue has room, starting a worker
///    to take it if none is alive
/// 3. otherwise start a worker above the core size, up to `max_workers`
/// 4. otherwise apply the [`SaturationPolicy`]
///
/// Workers above the core size exit after `keep_alive` without work. A panic
/// in a job is logged and the worker carries on.
///
/// A `WorkerPool` runs jobs as they are; it does not propagate context. Wrap
/// it in a [`PropagatingExecutor`](super::PropagatingExecutor) for that.
///
/// ```rust
/// use tracewise::{Executor, ExecutorConfig, WorkerPool};
/// use std::time::Duration;
///
/// let pool = WorkerPool::new(ExecutorConfig::default().core_workers(2)).unwrap();
/// let handle = pool.submit(|| 6 * 7).unwrap();
/// assert_eq!(handle.join(), Ok(42));
///
/// pool.shutdown();
/// assert!(pool.await_termination(Duration::from_secs(5)));
/// assert!(pool.execute(|| ()).is_err());
/// ```
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Creates a pool. Workers are started lazily, as work arrives.
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecutorError> {
        config.validate()?;
        Ok(WorkerPool {
            shared: Arc::new(PoolShared {
                config,
                state: Mutex::new(PoolState {
                    queue: VecDeque::new(),
                    workers: 0,
                    idle: 0,
                    active: 0,
                    completed: 0,
                    shut_down: false,
                }),
                work_available: Condvar::new(),
                terminated: Condvar::new(),
                next_thread: AtomicUsize::new(1),
            }),
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.shared.config
    }

    /// Stops accepting work. Queued and running jobs still finish.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        if !state.shut_down {
            state.shut_down = true;
            crate::debuginternal_sync!(
                "pool shutting down ({} queued, {} workers)",
                state.queue.len(),
                state.workers
            );
        }
        if state.workers == 0 {
            self.shared.terminated.notify_all();
        }
        drop(state);
        self.shared.work_available.notify_all();
    }

    /// Stops accepting work and drops every queued job, returning how many
    /// were dropped. Jobs already running finish; handles of dropped jobs
    /// resolve to [`JoinError::Cancelled`](super::JoinError::Cancelled).
    pub fn shutdown_now(&self) -> usize {
        let dropped: Vec<Job> = {
            let mut state = self.shared.lock();
            state.shut_down = true;
            if state.workers == 0 {
                self.shared.terminated.notify_all();
            }
            state.queue.drain(..).collect()
        };
        self.shared.work_available.notify_all();
        let count = dropped.len();
        drop(dropped);
        if count > 0 {
            crate::warn_sync!("pool shut down, dropped {} queued jobs", count);
        }
        count
    }

    /// Blocks until the pool has shut down and every worker has exited, or
    /// until `timeout` elapses. Returns whether the pool terminated in time.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .terminated
            .wait_timeout_while(state, timeout, |s| !(s.shut_down && s.workers == 0))
            .unwrap_or_else(PoisonError::into_inner);
        state.shut_down && state.workers == 0
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().shut_down
    }

    /// Shut down, with every worker gone.
    pub fn is_terminated(&self) -> bool {
        let state = self.shared.lock();
        state.shut_down && state.workers == 0
    }

    /// Live worker threads.
    pub fn pool_size(&self) -> usize {
        self.shared.lock().workers
    }

    /// Workers currently running a job.
    pub fn active_count(&self) -> usize {
        self.shared.lock().active
    }

    pub fn queued_count(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Jobs run to completion by workers, including ones that panicked.
    pub fn completed_count(&self) -> u64 {
        self.shared.lock().completed
    }

    /// Starts a worker, running `first` before it takes from the queue. The
    /// caller has already counted it in `workers`, and in `active` when
    /// there is a first job.
    fn start_worker(&self, first: Option<Job>) -> Result<(), ExecutorError> {
        let counted_active = first.is_some();
        let n = self.shared.next_thread.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}{}", self.shared.config.thread_name_prefix, n);
        let shared = self.shared.clone();
        let spawned = std::thread::Builder::new()
            .name(name)
            .spawn(move || worker_loop(shared, first));
        if let Err(e) = spawned {
            let mut state = self.shared.lock();
            state.workers -= 1;
            if counted_active {
                state.active -= 1;
            }
            if state.shut_down && state.workers == 0 {
                self.shared.terminated.notify_all();
            }
            crate::error_sync!("failed to spawn worker thread: {}", e);
            return Err(ExecutorError::Spawn(e));
        }
        Ok(())
    }
}

impl Executor for WorkerPool {
    fn execute_job(&self, job: Job) -> Result<(), ExecutorError> {
        let config = &self.shared.config;
        let mut state = self.shared.lock();
        if state.shut_down {
            return Err(ExecutorError::ShutDown);
        }
        if state.workers < config.core_workers {
            state.workers += 1;
            state.active += 1;
            drop(state);
            return self.start_worker(Some(job));
        }
        if state.queue.len() < config.queue_capacity || state.queue.len() < state.idle {
            state.queue.push_back(job);
            // with no core workers nothing may be alive to take it
            if state.workers == 0 {
                state.workers += 1;
                drop(state);
                return self.start_worker(None);
            }
            drop(state);
            self.shared.work_available.notify_one();
            return Ok(());
        }
        if state.workers < config.max_workers {
            state.workers += 1;
            state.active += 1;
            drop(state);
            return self.start_worker(Some(job));
        }

        let (queued, workers) = (state.queue.len(), state.workers);
        match config.saturation {
            SaturationPolicy::Reject => Err(ExecutorError::Saturated { queued, workers }),
            SaturationPolicy::CallerRuns => {
                drop(state);
                job();
                Ok(())
            }
            SaturationPolicy::Discard => {
                drop(state);
                crate::warn_sync!("pool saturated, discarding job ({} queued, {} workers)", queued, workers);
                drop(job);
                Ok(())
            }
            SaturationPolicy::DiscardOldest => {
                let oldest = state.queue.pop_front();
                state.queue.push_back(job);
                drop(state);
                self.shared.work_available.notify_one();
                if oldest.is_some() {
                    crate::warn_sync!("pool saturated, discarding oldest queued job");
                }
                drop(oldest);
                Ok(())
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("workers", &state.workers)
            .field("active", &state.active)
            .field("queued", &state.queue.len())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

fn worker_loop(shared: Arc<PoolShared>, first: Option<Job>) {
    crate::debuginternal_sync!("worker started");
    let mut job = first;
    loop {
        if let Some(job) = job.take() {
            if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(job)) {
                crate::error_sync!("job panicked on worker: {}", panic_message(payload.as_ref()));
            }
            let mut state = shared.lock();
            state.active -= 1;
            state.completed += 1;
        }
        match next_job(&shared) {
            Some(next) => job = Some(next),
            None => break,
        }
    }
    crate::debuginternal_sync!("worker exiting");
}

/// Waits for the next job. `None` means the worker should exit, and it has
/// already been removed from the worker count.
fn next_job(shared: &PoolShared) -> Option<Job> {
    let mut state = shared.lock();
    state.idle += 1;
    loop {
        if let Some(job) = state.queue.pop_front() {
            state.idle -= 1;
            state.active += 1;
            return Some(job);
        }
        if state.shut_down {
            break;
        }
        if state.workers > shared.config.core_workers {
            let (next, timeout) = shared
                .work_available
                .wait_timeout(state, shared.config.keep_alive)
                .unwrap_or_else(PoisonError::into_inner);
            state = next;
            if timeout.timed_out()
                && state.queue.is_empty()
                && state.workers > shared.config.core_workers
            {
                break;
            }
        } else {
            state = shared
                .work_available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
    state.idle -= 1;
    state.workers -= 1;
    if state.shut_down && state.workers == 0 {
        shared.terminated.notify_all();
    }
    None
}
