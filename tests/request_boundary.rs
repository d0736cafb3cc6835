// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlation ids at the request boundary, followed into worker pools.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use http::{HeaderMap, Request, Response, StatusCode};
use tracewise::context::{ContextStore, ThreadLocalStore, current_trace_id};
use tracewise::{
    Executor, ExecutorConfig, InMemoryLogger, PropagatingExecutor, Propagator, RequestBoundary,
    TraceId, global_loggers, set_global_loggers,
};

static LOGGER_GUARD: Mutex<()> = Mutex::new(());

fn with_memory_logger<R>(f: impl FnOnce(&InMemoryLogger) -> R) -> R {
    let _guard = LOGGER_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    let original = global_loggers();
    let logger = Arc::new(InMemoryLogger::new());
    set_global_loggers(vec![logger.clone()]);
    let result = f(&logger);
    set_global_loggers(original);
    result
}

fn is_trace_id_format(id: &str) -> bool {
    id.len() == 32 && id.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[test]
fn inbound_header_reaches_every_log_line() {
    let executor = PropagatingExecutor::with_config(ExecutorConfig::default().core_workers(2)).unwrap();
    let propagator = Propagator::new();
    let boundary = RequestBoundary::new();

    let (response, lines) = with_memory_logger(|logger| {
        let request = Request::get("/checkout")
            .header("x-trace-id", "abc123")
            .body(())
            .unwrap();
        let response = boundary.handle(request, |_req| {
            tracewise::info_sync!("pricing cart");
            let tax = executor
                .submit(|| {
                    tracewise::info_sync!("computing tax");
                    17
                })
                .unwrap()
                .join()
                .unwrap();
            let total = futures::executor::block_on(propagator.map(async { 100 }, move |subtotal| {
                tracewise::warn_sync!("total above threshold");
                subtotal + tax
            }));
            tracewise::error_sync!("payment provider slow");
            let mut response = Response::new(total.to_string());
            *response.status_mut() = StatusCode::CREATED;
            response
        });
        (response, logger.drain_logs())
    });

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.body(), "117");
    assert_eq!(response.headers()["x-trace-id"], "abc123");

    let lines: Vec<&str> = lines.lines().collect();
    for expected in [
        "request started: GET /checkout",
        "pricing cart",
        "computing tax",
        "total above threshold",
        "payment provider slow",
        "request completed: GET /checkout",
    ] {
        let line = lines
            .iter()
            .find(|l| l.contains(expected))
            .unwrap_or_else(|| panic!("no line for {expected:?} in {lines:#?}"));
        assert!(line.contains("traceId=abc123"), "{line}");
    }
    assert_eq!(current_trace_id(), None);

    executor.shutdown();
}

#[test]
fn missing_header_generates_and_echoes() {
    let boundary = RequestBoundary::new();
    for header in [None, Some(""), Some("   ")] {
        let mut builder = Request::get("/health");
        if let Some(value) = header {
            builder = builder.header("x-trace-id", value);
        }
        let request = builder.body(()).unwrap();
        let mut installed = None;
        let response = boundary.handle(request, |_req| {
            installed = current_trace_id();
            Response::new(())
        });
        let echoed = response.headers()["x-trace-id"].to_str().unwrap().to_string();
        assert!(is_trace_id_format(&echoed), "{header:?} gave {echoed:?}");
        assert_eq!(installed, Some(echoed));
    }
    assert!(ThreadLocalStore.get().is_absent());
}

#[test]
fn concurrent_requests_never_share_an_id() {
    let executor = PropagatingExecutor::with_config(
        ExecutorConfig::default()
            .core_workers(8)
            .max_workers(8)
            .queue_capacity(10_000),
    )
    .unwrap();
    let ids = Arc::new(Mutex::new(Vec::with_capacity(10_000)));
    let boundary = Arc::new(RequestBoundary::new());

    let handles: Vec<_> = (0..10_000)
        .map(|_| {
            let boundary = boundary.clone();
            let ids = ids.clone();
            executor
                .submit(move || {
                    let guard = boundary.enter(&HeaderMap::new());
                    let mut outbound = HeaderMap::new();
                    guard.echo(&mut outbound);
                    ids.lock()
                        .unwrap()
                        .push(outbound["x-trace-id"].to_str().unwrap().to_string());
                })
                .unwrap()
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let ids = ids.lock().unwrap();
    assert_eq!(ids.len(), 10_000);
    assert!(ids.iter().all(|id| is_trace_id_format(id)));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 10_000);
}

#[test]
fn generated_ids_are_distinct() {
    let a = TraceId::generate();
    let b = TraceId::generate();
    assert_ne!(a, b);
    assert!(is_trace_id_format(a.as_str()));
}

#[test_executors::async_test]
async fn async_handler_keeps_id_across_awaits() {
    let executor = PropagatingExecutor::with_config(ExecutorConfig::default().core_workers(1)).unwrap();
    let boundary = RequestBoundary::new();
    let request = Request::post("/orders")
        .header("x-trace-id", "async-abc")
        .body("order")
        .unwrap();

    let response = boundary
        .handle_async(request, |req| {
            let submitted = executor.submit(current_trace_id).unwrap();
            async move {
                let from_worker = submitted.await.unwrap();
                let here = current_trace_id();
                Response::new(format!("{} {:?} {:?}", req.body(), from_worker, here))
            }
        })
        .await;

    assert_eq!(response.headers()["x-trace-id"], "async-abc");
    assert_eq!(
        response.body(),
        "order Some(\"async-abc\") Some(\"async-abc\")"
    );
    assert_eq!(current_trace_id(), None);
}
