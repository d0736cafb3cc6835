// SPDX-License-Identifier: MIT OR Apache-2.0

//! # In-Memory Logger
//!
//! Captures log records in memory instead of writing them out. This is the
//! tool for asserting that log lines emitted on worker threads, inside
//! continuations, or during a request carry the expected `traceId`.
//!
//! ```rust
//! use tracewise::InMemoryLogger;
//! use tracewise::global_logger::set_global_loggers;
//! use std::sync::Arc;
//!
//! let logger = Arc::new(InMemoryLogger::new());
//! set_global_loggers(vec![logger.clone()]);
//!
//! tracewise::warn_sync!("disk at {}%", 93);
//! assert!(logger.drain_logs().contains("disk at 93%"));
//! ```

use crate::log_record::LogRecord;
use crate::logger::{Logger, RecordFuture};
use std::sync::{Mutex, PoisonError};

/// An in-memory logger that keeps every record it receives.
///
/// Thread-safe; share it through an `Arc` and register it with
/// [`add_global_logger`](crate::add_global_logger) or
/// [`set_global_loggers`](crate::set_global_loggers).
#[derive(Debug, Default)]
pub struct InMemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl InMemoryLogger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Removes all captured records and returns them joined by newlines.
    pub fn drain_logs(&self) -> String {
        self.drain_records()
            .iter()
            .map(LogRecord::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Removes and returns all captured records.
    pub fn drain_records(&self) -> Vec<LogRecord> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *records)
    }

    /// Rendered lines whose record was produced under `trace_id`, without draining.
    pub fn lines_for(&self, trace_id: &str) -> Vec<String> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .filter(|r| r.trace_id() == Some(trace_id))
            .map(LogRecord::to_string)
            .collect()
    }

    /// Number of records captured so far.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Logger for InMemoryLogger {
    fn write_record(&self, record: LogRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    fn write_record_async<'s>(&'s self, record: LogRecord) -> RecordFuture<'s> {
        Box::pin(async move {
            self.write_record(record);
        })
    }

    fn flush(&self) {
        //nothing is buffered outside the records themselves
    }
}
