// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installing a correlation id where a request enters the process.
//!
//! A [`RequestBoundary`] sits in front of request handlers. On entry it takes
//! the inbound `X-Trace-Id` header, or generates an id when there is none,
//! and merges it into the context under [`TRACE_ID_KEY`]. On exit, on every
//! path including a panicking handler, it puts the key back the way it found
//! it, so a pooled server thread never carries one request's id into the
//! next. Every response carries the id back out in the same header.
//!
//! ```rust
//! use http::{Request, Response};
//! use tracewise::RequestBoundary;
//!
//! let boundary = RequestBoundary::new();
//! let request = Request::get("/orders/7")
//!     .header("x-trace-id", "abc123")
//!     .body(())
//!     .unwrap();
//!
//! let response = boundary.handle(request, |_req| {
//!     tracewise::info_sync!("loading order");
//!     Response::new("order 7")
//! });
//!
//! assert_eq!(response.headers()["x-trace-id"], "abc123");
//! assert_eq!(tracewise::context::current_trace_id(), None);
//! ```

mod trace_id;

#[cfg(test)]
mod tests;

use std::future::Future;
use std::marker::PhantomData;

use http::{HeaderMap, HeaderName, HeaderValue, Request, Response};

pub use crate::context::TRACE_ID_KEY;
pub use trace_id::TraceId;

use crate::Propagator;
use crate::context::{ContextStore, Snapshot, ThreadLocalStore};

/// Header carrying the correlation id, inbound and outbound.
pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// Installs correlation ids for requests.
#[derive(Debug, Clone, Default)]
pub struct RequestBoundary<S = ThreadLocalStore> {
    propagator: Propagator<S>,
}

impl RequestBoundary<ThreadLocalStore> {
    pub fn new() -> Self {
        RequestBoundary {
            propagator: Propagator::new(),
        }
    }
}

impl<S: ContextStore> RequestBoundary<S> {
    pub fn with_store(store: S) -> Self {
        RequestBoundary {
            propagator: Propagator::with_store(store),
        }
    }

    pub fn propagator(&self) -> &Propagator<S> {
        &self.propagator
    }

    /// Installs the request's correlation id on the current path.
    ///
    /// The id is merged into whatever context is already there. Dropping the
    /// returned guard restores the previous value of [`TRACE_ID_KEY`].
    pub fn enter(&self, headers: &HeaderMap) -> BoundaryGuard<S> {
        self.enter_route(headers, None)
    }

    fn enter_route(&self, headers: &HeaderMap, route: Option<String>) -> BoundaryGuard<S> {
        let trace_id = TraceId::from_headers_or_generate(headers);
        let store = self.propagator.store().clone();
        let previous = store.get();
        store.set(previous.with(TRACE_ID_KEY, trace_id.as_str()));
        log_started(route.as_deref(), &trace_id);
        BoundaryGuard {
            store,
            previous,
            trace_id,
            route,
            _not_send: PhantomData,
        }
    }

    /// Runs a synchronous handler inside the boundary and echoes the id on
    /// its response.
    pub fn handle<B, R, H>(&self, request: Request<B>, handler: H) -> Response<R>
    where
        H: FnOnce(Request<B>) -> Response<R>,
    {
        let guard = self.enter_route(request.headers(), Some(route_of(&request)));
        let mut response = handler(request);
        guard.echo(response.headers_mut());
        response
    }

    /// Runs an asynchronous handler inside the boundary and echoes the id on
    /// its response.
    ///
    /// The request's context is installed around every poll of the handler
    /// only, so the thread polling this future keeps its own context between
    /// polls and after completion.
    pub async fn handle_async<B, R, H, Fut>(&self, request: Request<B>, handler: H) -> Response<R>
    where
        H: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response<R>>,
    {
        let trace_id = TraceId::from_headers_or_generate(request.headers());
        let route = route_of(&request);
        let snapshot: Snapshot = self.propagator.capture().with(TRACE_ID_KEY, trace_id.as_str());

        let fut = self.propagator.run_with(&snapshot, || {
            log_started(Some(&route), &trace_id);
            handler(request)
        });
        let mut response = self.propagator.scope_with(fut, snapshot.clone()).await;
        self.propagator
            .run_with(&snapshot, || log_completed(Some(&route), &trace_id));

        echo_header(&trace_id, response.headers_mut());
        response
    }
}

/// An installed correlation id. See [`RequestBoundary::enter`].
///
/// Dropping the guard restores the store of the thread that drops it, so the
/// guard stays on the thread that entered. It is neither `Send` nor meant to
/// be held across an `.await`; async handlers go through
/// [`RequestBoundary::handle_async`].
///
/// ```compile_fail
/// fn on_another_thread<T: Send + 'static>(_: T) {}
///
/// let guard = tracewise::RequestBoundary::new().enter(&http::HeaderMap::new());
/// on_another_thread(guard);
/// ```
#[must_use = "the correlation id is removed when the guard is dropped"]
#[derive(Debug)]
pub struct BoundaryGuard<S: ContextStore = ThreadLocalStore> {
    store: S,
    previous: Snapshot,
    trace_id: TraceId,
    route: Option<String>,
    _not_send: PhantomData<*const ()>,
}

impl<S: ContextStore> BoundaryGuard<S> {
    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// Writes the correlation id to an outbound header map.
    pub fn echo(&self, headers: &mut HeaderMap) {
        echo_header(&self.trace_id, headers);
    }
}

impl<S: ContextStore> Drop for BoundaryGuard<S> {
    fn drop(&mut self) {
        // logged while the id is still installed
        log_completed(self.route.as_deref(), &self.trace_id);

        let current = self.store.get();
        let restored = match self.previous.get(TRACE_ID_KEY) {
            Some(previous) => current.with(TRACE_ID_KEY, previous),
            None => current.without(TRACE_ID_KEY),
        };
        if self.previous.is_absent() && restored.is_empty() {
            self.store.clear();
        } else {
            self.store.set(restored);
        }
    }
}

fn route_of<B>(request: &Request<B>) -> String {
    format!("{} {}", request.method(), request.uri().path())
}

fn echo_header(trace_id: &TraceId, headers: &mut HeaderMap) {
    let name = HeaderName::from_static("x-trace-id");
    match HeaderValue::from_str(trace_id.as_str()) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(e) => crate::warn_sync!("cannot echo trace id {:?}: {}", trace_id.as_str(), e),
    }
}

fn log_started(route: Option<&str>, trace_id: &TraceId) {
    match route {
        Some(route) => crate::info_sync!("request started: {} traceId={}", route, trace_id),
        None => crate::info_sync!("request started: traceId={}", trace_id),
    }
}

fn log_completed(route: Option<&str>, trace_id: &TraceId) {
    match route {
        Some(route) => crate::info_sync!("request completed: {} traceId={}", route, trace_id),
        None => crate::info_sync!("request completed: traceId={}", trace_id),
    }
}
