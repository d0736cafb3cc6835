// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use crate::logger::{Logger, RecordFuture};

/**
The default logger: one line per record on stderr.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StdErrorLogger {}

impl StdErrorLogger {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Logger for StdErrorLogger {
    fn write_record(&self, record: LogRecord) {
        use std::io::Write;
        let mut lock = std::io::stderr().lock();
        // A closed stderr must not take the worker down with it.
        for part in record.parts {
            if lock.write_all(part.as_bytes()).is_err() {
                return;
            }
        }
        let _ = lock.write_all(b"\n");
    }

    fn write_record_async<'s>(&'s self, record: LogRecord) -> RecordFuture<'s> {
        Box::pin(async move { self.write_record(record) })
    }

    fn flush(&self) {
        //unbuffered
    }
}
