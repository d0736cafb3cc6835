// SPDX-License-Identifier: MIT OR Apache-2.0
tracewise::declare_logging_domain!();

#[cfg(test)]
mod tests {
    use tracewise::context::{ContextStore, ThreadLocalStore};
    use tracewise::{Level, Propagator, log_enabled};

    #[test]
    fn test_log_enabled() {
        ThreadLocalStore.clear();
        assert!(log_enabled!(Level::Info));

        // Trace depends on context, initially false
        assert!(!log_enabled!(Level::Trace));

        tracewise::context::begin_trace();
        assert_eq!(log_enabled!(Level::Trace), cfg!(debug_assertions));

        // Error is always enabled
        assert!(log_enabled!(Level::Error));
        ThreadLocalStore.clear();
    }

    #[test]
    fn test_trace_flag_travels_with_context() {
        ThreadLocalStore.clear();
        tracewise::context::begin_trace();
        let job = Propagator::new().wrap(|| log_enabled!(Level::Trace));
        ThreadLocalStore.clear();

        let enabled = std::thread::spawn(move || job.call()).join().unwrap();
        assert_eq!(enabled, cfg!(debug_assertions));
        assert!(!log_enabled!(Level::Trace));
    }

    #[test]
    fn test_debuginternal_off_by_default() {
        ThreadLocalStore.clear();
        assert!(!log_enabled!(Level::DebugInternal, || false));
        assert_eq!(
            log_enabled!(Level::DebugInternal, || true),
            cfg!(debug_assertions)
        );
    }
}
