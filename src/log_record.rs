// SPDX-License-Identifier: MIT OR Apache-2.0

//! Log record type.
//!
//! A [`LogRecord`] accumulates the parts of one log line and remembers the
//! correlation id of the execution path that created it. Parts are stored
//! separately and only joined on output, so building a record never requires
//! a shared buffer.
//!
//! # Example
//!
//! ```rust
//! use tracewise::{LogRecord, Level};
//!
//! let mut record = LogRecord::new(Level::Info);
//! record.log_trace_id(Some("4bf92f3577b34da6a3ce929d0e0e4736"));
//! record.log("handled ");
//! record.log_owned(format!("#{}", 42));
//! assert_eq!(record.trace_id(), Some("4bf92f3577b34da6a3ce929d0e0e4736"));
//! assert!(record.to_string().contains("traceId=4bf92f3577b34da6a3ce929d0e0e4736"));
//! ```

use crate::Level;
use std::fmt::{Debug, Display};
use std::sync::OnceLock;
use std::time::Instant;

static INITIAL_TIMESTAMP: OnceLock<Instant> = OnceLock::new();

fn initial_timestamp() -> Instant {
    *INITIAL_TIMESTAMP.get_or_init(Instant::now)
}

/**
A log record.

1.  Create a new [LogRecord].
2.  Progressively write to the [LogRecord].
3.  Finish the [LogRecord] and submit it to the [crate::Logger]s.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogRecord {
    pub(crate) parts: Vec<String>,
    level: Level,
    trace_id: Option<String>,
}

impl LogRecord {
    /**
    Append the message to the record.
    */
    pub fn log(&mut self, message: &str) {
        self.parts.push(message.to_string());
    }

    /**
    Append the message to the record, taking ownership of the message.
    */
    pub fn log_owned(&mut self, message: String) {
        self.parts.push(message);
    }

    pub fn new(level: Level) -> Self {
        Self {
            parts: Vec::new(),
            level,
            trace_id: None,
        }
    }

    /**
    Log the correlation id as `traceId=<id> `, or `traceId=- ` when the path has none.

    The id is also kept on the record so loggers can filter by request.
    */
    pub fn log_trace_id(&mut self, trace_id: Option<&str>) {
        self.log_owned(format!("traceId={} ", trace_id.unwrap_or("-")));
        self.trace_id = trace_id.map(str::to_string);
    }

    /**
    Log the current time to the record, followed by a space.
    */
    pub fn log_timestamp(&mut self) -> Instant {
        let time = Instant::now();
        let duration = time.duration_since(initial_timestamp());
        self.log_owned(format!("[{:?}] ", duration));
        time
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The correlation id written by [Self::log_trace_id], if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }
}

impl Default for LogRecord {
    fn default() -> Self {
        Self::new(Level::Info)
    }
}

impl Display for LogRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}
