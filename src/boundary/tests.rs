// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the boundary module.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError};

use http::{HeaderMap, Request, Response};

use super::*;
use crate::context::current_trace_id;
use crate::global_logger::{TEST_LOGGER_GUARD, global_loggers, set_global_loggers};
use crate::inmemory_logger::InMemoryLogger;

fn headers_with(id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-trace-id", id.parse().unwrap());
    headers
}

fn is_trace_id_format(id: &str) -> bool {
    id.len() == 32 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[test]
fn generated_ids_are_32_lowercase_hex() {
    for _ in 0..100 {
        let id = TraceId::generate();
        assert!(is_trace_id_format(id.as_str()), "{id}");
    }
}

#[test]
fn blank_headers_generate() {
    for blank in ["", "   ", "\t"] {
        let id = TraceId::from_headers_or_generate(&headers_with(blank));
        assert!(is_trace_id_format(id.as_str()), "{blank:?} gave {id}");
    }
    assert_eq!(TraceId::from_headers(&HeaderMap::new()), None);
}

#[test]
fn inbound_id_kept_verbatim() {
    let id = TraceId::from_headers(&headers_with(" Mixed-Case ")).unwrap();
    assert_eq!(id.as_str(), " Mixed-Case ");
}

#[test]
fn non_utf8_header_generates() {
    let mut headers = HeaderMap::new();
    headers.insert("x-trace-id", http::HeaderValue::from_bytes(b"\xfa\xfb").unwrap());
    assert_eq!(TraceId::from_headers(&headers), None);
}

#[test]
fn header_lookup_is_case_insensitive() {
    let mut headers = HeaderMap::new();
    headers.insert(http::HeaderName::from_static("x-trace-id"), "abc".parse().unwrap());
    assert_eq!(TraceId::from_headers(&headers).unwrap().as_str(), "abc");
}

#[test]
fn enter_installs_and_drop_removes() {
    ThreadLocalStore.clear();
    let boundary = RequestBoundary::new();
    let guard = boundary.enter(&headers_with("enter-drop"));
    assert_eq!(current_trace_id().as_deref(), Some("enter-drop"));
    assert_eq!(guard.trace_id().as_str(), "enter-drop");

    let mut outbound = HeaderMap::new();
    guard.echo(&mut outbound);
    assert_eq!(outbound["x-trace-id"], "enter-drop");

    drop(guard);
    assert!(ThreadLocalStore.get().is_absent());
}

#[test]
fn enter_merges_with_existing_keys() {
    ThreadLocalStore.set(Snapshot::empty().with("tenant", "acme"));
    let boundary = RequestBoundary::new();
    {
        let _guard = boundary.enter(&HeaderMap::new());
        let ctx = ThreadLocalStore.get();
        assert_eq!(ctx.get("tenant"), Some("acme"));
        assert!(is_trace_id_format(ctx.get(TRACE_ID_KEY).unwrap()));
    }
    let ctx = ThreadLocalStore.get();
    assert_eq!(ctx.get("tenant"), Some("acme"));
    assert_eq!(ctx.get(TRACE_ID_KEY), None);
    ThreadLocalStore.clear();
}

#[test]
fn nested_boundary_restores_outer_id() {
    ThreadLocalStore.clear();
    let boundary = RequestBoundary::new();
    let outer = boundary.enter(&headers_with("outer"));
    {
        let _inner = boundary.enter(&headers_with("inner"));
        assert_eq!(current_trace_id().as_deref(), Some("inner"));
    }
    assert_eq!(current_trace_id().as_deref(), Some("outer"));
    drop(outer);
    assert_eq!(current_trace_id(), None);
}

#[test]
fn panicking_handler_still_cleans_up() {
    ThreadLocalStore.clear();
    let boundary = RequestBoundary::new();
    let request = Request::get("/boom").header("x-trace-id", "panicky").body(()).unwrap();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        boundary.handle(request, |_req| -> Response<()> { panic!("handler failed") })
    }));
    assert!(result.is_err());
    assert!(ThreadLocalStore.get().is_absent());
}

#[test]
fn handle_echoes_generated_id() {
    ThreadLocalStore.clear();
    let boundary = RequestBoundary::new();
    let request = Request::post("/orders").body("{}").unwrap();
    let mut seen = None;
    let response = boundary.handle(request, |req| {
        assert_eq!(req.body(), &"{}");
        seen = current_trace_id();
        Response::new(())
    });
    let echoed = response.headers()["x-trace-id"].to_str().unwrap();
    assert!(is_trace_id_format(echoed));
    assert_eq!(seen.as_deref(), Some(echoed));
    assert_eq!(current_trace_id(), None);
}

#[test]
fn log_lines_carry_inbound_id() {
    let _guard = TEST_LOGGER_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let original = global_loggers();
    let logger = Arc::new(InMemoryLogger::new());
    set_global_loggers(vec![logger.clone()]);

    let boundary = RequestBoundary::new();
    let request = Request::get("/orders/7").header("x-trace-id", "unit-abc123").body(()).unwrap();
    let response = boundary.handle(request, |_req| {
        crate::info_sync!("loading order {}", 7);
        crate::warn_sync!("order {} is stale", 7);
        Response::new(())
    });
    set_global_loggers(original);

    assert_eq!(response.headers()["x-trace-id"], "unit-abc123");
    let lines = logger.lines_for("unit-abc123");
    assert_eq!(lines.len(), 4, "{lines:#?}");
    assert!(lines[0].contains("request started: GET /orders/7"));
    assert!(lines[1].contains("loading order 7"));
    assert!(lines[2].contains("order 7 is stale"));
    assert!(lines[3].contains("request completed: GET /orders/7"));
    for line in &lines {
        assert!(line.contains("traceId=unit-abc123"), "{line}");
    }
}

#[test]
fn handle_async_leaves_poller_untouched() {
    ThreadLocalStore.set(Snapshot::empty().with(TRACE_ID_KEY, "poller"));
    let boundary = RequestBoundary::new();
    let request = Request::get("/async").header("x-trace-id", "async-id").body(()).unwrap();

    let fut = boundary.handle_async(request, |_req| async {
        let mut response = Response::new(());
        if let Some(id) = current_trace_id() {
            response.headers_mut().insert("x-seen", id.parse().unwrap());
        }
        response
    });
    let response = futures::executor::block_on(fut);

    assert_eq!(response.headers()["x-trace-id"], "async-id");
    assert_eq!(response.headers()["x-seen"], "async-id");
    assert_eq!(current_trace_id().as_deref(), Some("poller"));
    ThreadLocalStore.clear();
}

#[test]
fn concurrent_requests_get_distinct_ids() {
    let boundary = RequestBoundary::new();
    let ids: Vec<String> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    (0..1250)
                        .map(|_| {
                            let guard = boundary.enter(&HeaderMap::new());
                            guard.trace_id().to_string()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
    });
    assert_eq!(ids.len(), 10_000);
    assert!(ids.iter().all(|id| is_trace_id_format(id)));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10_000);
}
