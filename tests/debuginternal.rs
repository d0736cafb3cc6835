// SPDX-License-Identifier: MIT OR Apache-2.0

//! `debuginternal_sync!` follows the logging domain declared by the crate
//! that uses it.

tracewise::declare_logging_domain!(true);

use std::sync::Arc;
use tracewise::context::{ContextStore, ThreadLocalStore};
use tracewise::{InMemoryLogger, set_global_loggers};

#[test]
fn test_debuginternal_enabled_for_declared_domain() {
    ThreadLocalStore.clear();
    ThreadLocalStore.put("traceId", "internal-1");

    let logger = Arc::new(InMemoryLogger::new());
    set_global_loggers(vec![logger.clone()]);

    tracewise::debuginternal_sync!("test message {}", 1);
    ThreadLocalStore.clear();

    let lines = logger.lines_for("internal-1");
    if cfg!(debug_assertions) {
        assert_eq!(lines.len(), 1, "debuginternal should be enabled for this domain");
        assert!(lines[0].contains("DEBUG: "));
        assert!(lines[0].contains("test message 1"));
    } else {
        assert!(lines.is_empty());
    }
}
