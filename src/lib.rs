//SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# tracewise

tracewise carries a request's correlation id, and any other key/value diagnostic
context, across every concurrency boundary a request crosses inside one process:
thread handoffs, worker-pool submissions, and chained asynchronous continuations.
Every log line emitted anywhere in the request's execution graph carries
`traceId=<id>`, so the lines can be correlated back to the request.

# Development status

tracewise is experimental and the API may change.

# The problem

Diagnostic context is usually thread-local. That works until the first unit of
work moves to another thread. A pooled worker does not know which request
submitted the job it is running; worse, it may still hold the context of the
*previous* request it served, so its log lines confidently name the wrong id.

Implicit inheritance does not fix this. A pooled worker's "parent" at spawn time
is meaningless after the first reuse.

# The model

tracewise never propagates implicitly. Context crosses a boundary only as an
explicit [`Snapshot`](context::Snapshot), captured on the path that *creates* the
work and installed on the path that *runs* it:

| Boundary                 | Captured when                       | API                                        |
|--------------------------|-------------------------------------|--------------------------------------------|
| closure / thread handoff | the closure is wrapped              | [`Propagator::wrap`]                       |
| worker pool              | the task is submitted               | [`PropagatingExecutor`]                    |
| future                   | the future is scoped                | [`Propagator::scope`]                      |
| continuation             | the continuation is attached        | [`Propagator::map`], [`Propagator::then`]  |
| inbound request          | the request arrives                 | [`RequestBoundary`]                        |

Running work under a snapshot always saves the running path's own context first
and restores it afterwards, also when the work fails or panics. A worker's
unrelated context is never lost, and a request's context never outlives the
work that needed it.

# The API

```rust
use std::time::Duration;
use http::{Request, Response};
use tracewise::{Executor, ExecutorConfig, PropagatingExecutor, RequestBoundary};

let executor = PropagatingExecutor::with_config(ExecutorConfig::default()).unwrap();
let boundary = RequestBoundary::new();

let request = Request::get("/orders").header("x-trace-id", "abc123").body(()).unwrap();
let response = boundary.handle(request, |_req| {
    tracewise::info_sync!("listing orders");
    let count = executor
        .submit(|| {
            // runs on a pool worker, still under traceId=abc123
            tracewise::info_sync!("querying");
            3
        })
        .unwrap()
        .join()
        .unwrap();
    Response::new(format!("{count} orders"))
});
assert_eq!(response.headers()["x-trace-id"], "abc123");

executor.shutdown();
assert!(executor.await_termination(Duration::from_secs(5)));
```

# Logging

Log lines go through a small facade: [`trace_sync!`], [`debuginternal_sync!`],
[`info_sync!`], [`warn_sync!`], [`error_sync!`] and their async forms. Every
record starts with the `traceId` of the path that emitted it. Records go to
the global [`Logger`]s, by default stderr; tests install an [`InMemoryLogger`]
to make assertions about what was logged.

`trace` logs are only produced in debug builds, for contexts marked with
[`context::begin_trace`]. Because the mark is an ordinary context entry, it
follows the request everywhere its id goes.
*/

mod level;
mod logger;
mod stderror_logger;
mod inmemory_logger;
pub mod global_logger;
mod macros;
mod log_record;
pub mod context;
pub mod propagate;
pub mod executor;
pub mod boundary;

declare_logging_domain!();

pub use level::Level;
pub use logger::{Logger, RecordFuture};
pub use log_record::LogRecord;
pub use inmemory_logger::InMemoryLogger;
pub use stderror_logger::StdErrorLogger;
pub use global_logger::{add_global_logger, flush_global_loggers, global_loggers, set_global_loggers};

pub use macros::LoggingDomain;

pub use propagate::{Propagating, Propagator, RestoreGuard, WithContext};
pub use executor::{
    Executor, ExecutorConfig, ExecutorError, Job, JoinError, PropagatingExecutor, SaturationPolicy,
    TaskHandle, WorkerPool,
};
pub use boundary::{BoundaryGuard, RequestBoundary, TRACE_ID_HEADER, TRACE_ID_KEY, TraceId};

#[doc(hidden)]
pub mod hidden {
    pub use crate::macros::{
        debuginternal_pre, error_sync_pre, info_sync_pre, trace_sync_pre, warn_sync_pre,
        async_post, sync_post,
    };
}
