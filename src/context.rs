// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-execution-path diagnostic context.
//!
//! Every execution path (by default, every thread) owns one key/value
//! context. The reserved key `traceId` holds the correlation id of the request
//! the path is working for, and every log line reads it from here.
//!
//! - [`ContextStore`]: the accessor capability (`get`, `set`, `clear`, `get_value`)
//! - [`ThreadLocalStore`]: the default store, one context per OS thread
//! - [`Snapshot`]: an immutable copy of a context, the only thing that ever
//!   crosses from one path to another
//!
//! Context is never inherited implicitly. A spawned thread or a pooled worker
//! starts out with whatever it had before; to hand context over, capture a
//! [`Snapshot`] where the work is created and install it where the work runs,
//! which is what [`Propagator`](crate::Propagator) does.
//!
//! ```rust
//! use tracewise::context::{ContextStore, ThreadLocalStore};
//!
//! let store = ThreadLocalStore;
//! store.put("traceId", "abc123");
//! let snapshot = store.get();
//!
//! std::thread::spawn(move || {
//!     assert!(store.get().is_absent());
//!     store.set(snapshot);
//!     assert_eq!(tracewise::context::current_trace_id().as_deref(), Some("abc123"));
//!     store.clear();
//! })
//! .join()
//! .unwrap();
//! ```
//!
//! # Tracing
//!
//! [`begin_trace`] marks the current context so that `trace`-level logs are
//! emitted. The mark is an ordinary entry, so it travels with snapshots to
//! every worker and continuation the request fans out to.

mod snapshot;
mod store;

#[cfg(test)]
mod tests;

pub use snapshot::Snapshot;
pub use store::{ContextStore, ThreadLocalStore};

/// Context key holding the request's correlation id.
pub const TRACE_ID_KEY: &str = "traceId";

/// Context key that turns on `trace`-level logging for a path.
pub const TRACE_FLAG_KEY: &str = "trace";

/// The current thread's context.
#[inline]
pub fn current() -> Snapshot {
    ThreadLocalStore.get()
}

/// The current thread's correlation id, if a request installed one.
#[inline]
pub fn current_trace_id() -> Option<String> {
    ThreadLocalStore.get_value(TRACE_ID_KEY)
}

/// Enables `trace`-level logging for the current context and everything it
/// is propagated to afterwards.
pub fn begin_trace() {
    ThreadLocalStore.put(TRACE_FLAG_KEY, "1");
    crate::trace_sync!("Begin trace");
}

/// Whether the current thread's context has tracing enabled.
#[inline]
pub fn currently_tracing() -> bool {
    ThreadLocalStore.get_value(TRACE_FLAG_KEY).as_deref() == Some("1")
}
