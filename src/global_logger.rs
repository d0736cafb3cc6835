// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global logger management.
//!
//! Every record produced by the logging macros, by the worker pool, and by the
//! request boundary is delivered to each logger in this list. The list starts
//! out holding a single [`StdErrorLogger`](crate::stderror_logger::StdErrorLogger).
//!
//! # Examples
//!
//! ```
//! use tracewise::global_logger::{add_global_logger, global_loggers};
//! use tracewise::InMemoryLogger;
//! use std::sync::Arc;
//!
//! let before = global_loggers().len();
//! add_global_logger(Arc::new(InMemoryLogger::new()));
//! assert_eq!(global_loggers().len(), before + 1);
//! ```
//!
//! Loggers are reference counted: replacing the list with
//! [`set_global_loggers`] does not disturb a record that is being delivered
//! to an old logger on another thread.

use crate::logger::Logger;
use crate::stderror_logger::StdErrorLogger;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

static GLOBAL_LOGGERS: OnceLock<RwLock<Vec<Arc<dyn Logger>>>> = OnceLock::new();

fn loggers_lock() -> &'static RwLock<Vec<Arc<dyn Logger>>> {
    GLOBAL_LOGGERS.get_or_init(|| RwLock::new(vec![Arc::new(StdErrorLogger::new())]))
}

/// Retrieves the current set of global loggers.
///
/// The lock is held only long enough to clone the `Arc`s, so delivering a
/// record never blocks reconfiguration.
pub fn global_loggers() -> Vec<Arc<dyn Logger>> {
    loggers_lock()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Appends a logger; existing loggers keep receiving records.
pub fn add_global_logger(logger: Arc<dyn Logger>) {
    loggers_lock()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(logger);
}

/// Replaces all global loggers with a new set.
///
/// An empty vector silences logging entirely.
pub fn set_global_loggers(new_loggers: Vec<Arc<dyn Logger>>) {
    *loggers_lock()
        .write()
        .unwrap_or_else(PoisonError::into_inner) = new_loggers;
}

/// Flushes every global logger, e.g. before the process exits.
pub fn flush_global_loggers() {
    for logger in global_loggers() {
        logger.flush();
    }
}

/// Serializes unit tests that swap the global logger list.
#[cfg(test)]
pub(crate) static TEST_LOGGER_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());
