//SPDX-License-Identifier: MIT OR Apache-2.0
use crate::log_record::LogRecord;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

/// Future returned by [`Logger::write_record_async`].
pub type RecordFuture<'s> = Pin<Box<dyn Future<Output = ()> + Send + 's>>;

/// A destination for finished log records.
///
/// A record reaches its logger fully formatted, prelude and `traceId=`
/// included, whichever thread or continuation produced it. Loggers never look
/// at the context store.
///
/// Loggers are shared between every worker of every pool, hence `Send + Sync`.
pub trait Logger: Debug + Send + Sync {
    fn write_record(&self, record: LogRecord);

    /// Writes a record from async code.
    ///
    /// Unbuffered loggers can box a call to [`write_record`](Self::write_record).
    fn write_record_async<'s>(&'s self, record: LogRecord) -> RecordFuture<'s>;

    /// Pushes out anything buffered. Called by
    /// [`flush_global_loggers`](crate::flush_global_loggers).
    fn flush(&self);
}
