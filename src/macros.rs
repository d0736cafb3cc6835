// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logging macros and the functions they expand to.
//!
//! Each macro follows the same three phases:
//! 1. A `*_pre` function creates a [`LogRecord`] and writes the prelude: the
//!    tracing marker, `traceId=<id>` of the current execution path, the level
//!    tag, the call site and a timestamp
//! 2. The message is formatted into the record
//! 3. A `*_post` function hands the record to every global logger
//!
//! ```rust
//! use tracewise::context::{ContextStore, ThreadLocalStore};
//!
//! ThreadLocalStore.put("traceId", "abc123");
//! // emitted as ` traceId=abc123 INFO: src/main.rs:4:1 [..] charged 42 cents`
//! tracewise::info_sync!("charged {} cents", 42);
//! ThreadLocalStore.clear();
//! ```

use crate::Level;
use crate::log_record::LogRecord;
use crate::global_logger::global_loggers;

/// Controls whether `debuginternal` logs are produced for a crate.
///
/// Created by [`declare_logging_domain!`](crate::declare_logging_domain).
pub struct LoggingDomain {
    is_internal: bool,
}

impl LoggingDomain {
    #[inline]
    pub const fn new(enabled: bool) -> Self {
        Self {
            is_internal: enabled,
        }
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        self.is_internal
    }
}

impl std::fmt::Debug for LoggingDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingDomain")
            .field("is_internal", &self.is_internal)
            .finish()
    }
}

impl From<bool> for LoggingDomain {
    fn from(enabled: bool) -> Self {
        Self::new(enabled)
    }
}

/// Declares the logging domain for the current crate.
///
/// Must appear at the crate root before `debuginternal_sync!` is used. Without
/// arguments, internal logging follows the `tracewise_internal` feature of the
/// declaring crate; with an argument, it follows that expression.
///
/// ```rust
/// # #[macro_use] extern crate tracewise;
/// declare_logging_domain!(cfg!(debug_assertions));
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! declare_logging_domain {
    () => {
        #[doc(hidden)]
        #[cfg(feature = "tracewise_internal")]
        pub(crate) static __TRACEWISE_DOMAIN: $crate::LoggingDomain =
            $crate::LoggingDomain::new(true);
        #[doc(hidden)]
        #[cfg(not(feature = "tracewise_internal"))]
        pub(crate) static __TRACEWISE_DOMAIN: $crate::LoggingDomain =
            $crate::LoggingDomain::new(false);
    };
    ($enabled:expr) => {
        #[doc(hidden)]
        pub(crate) static __TRACEWISE_DOMAIN: $crate::LoggingDomain =
            $crate::LoggingDomain::new($enabled);
    };
}

/// Returns whether logging is enabled for a given [`Level`](crate::Level).
///
/// `Trace` needs a debug build and a context marked by
/// [`begin_trace`](crate::context::begin_trace). `DebugInternal` needs a debug
/// build and either an enabled domain or tracing. Everything else is always on,
/// since request logs are what correlation ids exist for.
#[macro_export]
macro_rules! log_enabled {
    ($level:expr) => {
        $crate::log_enabled!($level, || false)
    };
    ($level:expr, $domain:expr) => {{
        #[allow(unreachable_patterns)]
        match $level {
            $crate::Level::Trace => {
                ::std::cfg!(debug_assertions) && $crate::context::currently_tracing()
            }
            $crate::Level::DebugInternal => {
                ::std::cfg!(debug_assertions)
                    && (($domain)() || $crate::context::currently_tracing())
            }
            _ => true,
        }
    }};
}

/// Logs at `trace` level. See [`log_enabled!`](crate::log_enabled).
#[macro_export]
macro_rules! trace_sync {
    ($($arg:tt)+) => {{
        if $crate::log_enabled!($crate::Level::Trace) {
            let mut record = $crate::hidden::trace_sync_pre(file!(), line!(), column!());
            record.log_owned(::std::format!($($arg)+));
            $crate::hidden::sync_post(record);
        }
    }};
}

/// Print-style debugging, on only for crates whose logging domain is enabled.
#[macro_export]
macro_rules! debuginternal_sync {
    ($($arg:tt)+) => {{
        if $crate::log_enabled!($crate::Level::DebugInternal, || crate::__TRACEWISE_DOMAIN.is_internal()) {
            let mut record = $crate::hidden::debuginternal_pre(file!(), line!(), column!());
            record.log_owned(::std::format!($($arg)+));
            $crate::hidden::sync_post(record);
        }
    }};
}

/// Logs at `info` level.
#[macro_export]
macro_rules! info_sync {
    ($($arg:tt)+) => {{
        if $crate::log_enabled!($crate::Level::Info) {
            let mut record = $crate::hidden::info_sync_pre(file!(), line!(), column!());
            record.log_owned(::std::format!($($arg)+));
            $crate::hidden::sync_post(record);
        }
    }};
}

/// Logs at `info` level through the loggers' async path. Must be awaited.
#[macro_export]
macro_rules! info_async {
    ($($arg:tt)+) => {
        async {
            if $crate::log_enabled!($crate::Level::Info) {
                let mut record = $crate::hidden::info_sync_pre(file!(), line!(), column!());
                record.log_owned(::std::format!($($arg)+));
                $crate::hidden::async_post(record).await;
            }
        }
    };
}

/// Logs a suspicious condition.
#[macro_export]
macro_rules! warn_sync {
    ($($arg:tt)+) => {{
        let mut record = $crate::hidden::warn_sync_pre(file!(), line!(), column!());
        record.log_owned(::std::format!($($arg)+));
        $crate::hidden::sync_post(record);
    }};
}

/// Logs a runtime error.
#[macro_export]
macro_rules! error_sync {
    ($($arg:tt)+) => {{
        let mut record = $crate::hidden::error_sync_pre(file!(), line!(), column!());
        record.log_owned(::std::format!($($arg)+));
        $crate::hidden::sync_post(record);
    }};
}

/// Logs a runtime error through the loggers' async path. Must be awaited.
#[macro_export]
macro_rules! error_async {
    ($($arg:tt)+) => {
        async {
            let mut record = $crate::hidden::error_sync_pre(file!(), line!(), column!());
            record.log_owned(::std::format!($($arg)+));
            $crate::hidden::async_post(record).await;
        }
    };
}

/// Writes the prelude shared by every level.
fn pre(level: Level, file: &'static str, line: u32, column: u32) -> LogRecord {
    let mut record = LogRecord::new(level);
    let tracing = crate::context::currently_tracing();
    record.log(if tracing { "T" } else { " " });
    record.log_trace_id(crate::context::current_trace_id().as_deref());

    record.log(level.tag());
    record.log(": ");

    record.log(file);
    record.log_owned(format!(":{}:{} ", line, column));
    record.log_timestamp();
    record
}

pub fn trace_sync_pre(file: &'static str, line: u32, column: u32) -> LogRecord {
    pre(Level::Trace, file, line, column)
}

pub fn debuginternal_pre(file: &'static str, line: u32, column: u32) -> LogRecord {
    pre(Level::DebugInternal, file, line, column)
}

pub fn info_sync_pre(file: &'static str, line: u32, column: u32) -> LogRecord {
    pre(Level::Info, file, line, column)
}

pub fn warn_sync_pre(file: &'static str, line: u32, column: u32) -> LogRecord {
    pre(Level::Warning, file, line, column)
}

pub fn error_sync_pre(file: &'static str, line: u32, column: u32) -> LogRecord {
    pre(Level::Error, file, line, column)
}

/// Completes a record on every global logger.
pub fn sync_post(record: LogRecord) {
    for logger in global_loggers() {
        logger.write_record(record.clone());
    }
}

/// Completes a record on every global logger through their async path.
pub async fn async_post(record: LogRecord) {
    for logger in global_loggers() {
        logger.write_record_async(record.clone()).await;
    }
}
