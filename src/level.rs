//SPDX-License-Identifier: MIT OR Apache-2.0

/// Severity of a log record.
///
/// Every level is emitted with the caller's trace id in its prelude; the level
/// only decides whether the record is produced at all (see [`log_enabled!`](crate::log_enabled)).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Debug builds only, and only while the current context has tracing turned on
    Trace,
    /// Debug builds only, for the crate that declared an enabled logging domain
    DebugInternal,
    /// Request lifecycle and other routine events
    Info,
    /// Suspicious condition that did not stop the work
    Warning,
    /// Runtime error, e.g. a task that panicked on a worker
    Error,
}

impl Level {
    /// The tag written into each record's prelude.
    pub const fn tag(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::DebugInternal => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARN",
            Level::Error => "ERROR",
        }
    }
}
