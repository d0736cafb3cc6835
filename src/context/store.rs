// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-path key/value context store.

use std::cell::RefCell;

use super::snapshot::Snapshot;

/// Access to the diagnostic context of the currently running execution path.
///
/// Implementations decide what an "execution path" is; the contract is that
/// two paths running at the same time never see each other's writes. Nothing
/// here can fail: a path without context simply reads [`Snapshot::absent`].
///
/// Components that need the context take a store as a value instead of
/// reaching for a global, so the boundaries where context crosses threads are
/// visible in their signatures. [`ThreadLocalStore`] is the default.
pub trait ContextStore: Clone + Send + Sync + 'static {
    /// The current path's whole context.
    fn get(&self) -> Snapshot;

    /// Replaces the current path's context wholesale. Installing an absent
    /// snapshot clears it.
    fn set(&self, snapshot: Snapshot);

    /// Removes every key for the current path. Clearing twice is a no-op.
    fn clear(&self) {
        self.set(Snapshot::absent());
    }

    /// Reads one key.
    fn get_value(&self, key: &str) -> Option<String> {
        self.get().get(key).map(str::to_string)
    }

    /// Sets one key, keeping the others. Creates the context if none is installed.
    fn put(&self, key: &str, value: &str) {
        let current = self.get();
        self.set(current.with(key, value));
    }

    /// Removes one key and returns its previous value.
    ///
    /// Removing the last key leaves an empty context installed, not an absent one.
    fn remove(&self, key: &str) -> Option<String> {
        let current = self.get();
        let previous = current.get(key).map(str::to_string);
        if previous.is_some() {
            self.set(current.without(key));
        }
        previous
    }
}

thread_local! {
    static CONTEXT: RefCell<Snapshot> = const { RefCell::new(Snapshot::absent()) };
}

/// A [`ContextStore`] where each OS thread is its own execution path.
///
/// This is also the store the logging macros read the `traceId` from.
///
/// ```rust
/// use tracewise::context::{ContextStore, ThreadLocalStore};
///
/// let store = ThreadLocalStore;
/// store.put("traceId", "abc123");
/// assert_eq!(store.get_value("traceId").as_deref(), Some("abc123"));
///
/// std::thread::spawn(move || {
///     // other threads start out with no context
///     assert!(store.get().is_absent());
/// })
/// .join()
/// .unwrap();
///
/// store.clear();
/// assert!(store.get().is_absent());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ThreadLocalStore;

impl ContextStore for ThreadLocalStore {
    #[inline]
    fn get(&self) -> Snapshot {
        // Reads during thread-local teardown see no context.
        CONTEXT
            .try_with(|c| c.borrow().clone())
            .unwrap_or_default()
    }

    #[inline]
    fn set(&self, snapshot: Snapshot) {
        let _ = CONTEXT.try_with(|c| {
            *c.borrow_mut() = snapshot;
        });
    }

    fn get_value(&self, key: &str) -> Option<String> {
        CONTEXT
            .try_with(|c| c.borrow().get(key).map(str::to_string))
            .ok()
            .flatten()
    }
}
