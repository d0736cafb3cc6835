// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the context module.

use std::collections::HashMap;

use super::*;

#[test]
fn fresh_thread_has_absent_context() {
    std::thread::spawn(|| {
        assert!(ThreadLocalStore.get().is_absent());
        assert_eq!(current_trace_id(), None);
    })
    .join()
    .unwrap();
}

#[test]
fn absent_and_empty_are_different() {
    let absent = Snapshot::absent();
    let empty = Snapshot::empty();
    assert_ne!(absent, empty);
    assert!(absent.is_empty());
    assert!(empty.is_empty());
    assert!(absent.is_absent());
    assert!(!empty.is_absent());
    assert_eq!(absent.to_map(), None);
    assert_eq!(empty.to_map(), Some(Default::default()));
    assert_eq!(absent.to_string(), "-");
    assert_eq!(empty.to_string(), "{}");
}

#[test]
fn set_absent_clears() {
    let store = ThreadLocalStore;
    store.put(TRACE_ID_KEY, "set_absent_clears");
    store.set(Snapshot::absent());
    assert!(store.get().is_absent());
}

#[test]
fn set_empty_installs_empty_context() {
    let store = ThreadLocalStore;
    store.set(Snapshot::empty());
    let got = store.get();
    assert!(!got.is_absent());
    assert_eq!(got.len(), 0);
    store.clear();
}

#[test]
fn clear_is_idempotent() {
    let store = ThreadLocalStore;
    store.put("k", "v");
    store.clear();
    store.clear();
    assert!(store.get().is_absent());
}

#[test]
fn put_and_remove() {
    let store = ThreadLocalStore;
    store.clear();
    store.put("a", "1");
    store.put("b", "2");
    store.put("a", "3");
    assert_eq!(store.get_value("a").as_deref(), Some("3"));
    assert_eq!(store.get_value("b").as_deref(), Some("2"));

    assert_eq!(store.remove("a").as_deref(), Some("3"));
    assert_eq!(store.remove("a"), None);
    assert_eq!(store.remove("b").as_deref(), Some("2"));
    // removing the last key leaves an empty, present context
    assert!(!store.get().is_absent());
    assert!(store.get().is_empty());
    store.clear();
}

#[test]
fn snapshots_do_not_see_later_writes() {
    let store = ThreadLocalStore;
    store.clear();
    store.put(TRACE_ID_KEY, "before");
    let snapshot = store.get();
    store.put(TRACE_ID_KEY, "after");
    store.put("extra", "x");
    assert_eq!(snapshot.get(TRACE_ID_KEY), Some("before"));
    assert_eq!(snapshot.get("extra"), None);
    store.clear();
}

#[test]
fn with_and_without_copy_on_write() {
    let base = Snapshot::empty().with("a", "1");
    let more = base.with("b", "2");
    let less = more.without("a");
    assert_eq!(base.len(), 1);
    assert_eq!(more.len(), 2);
    assert_eq!(less.iter().collect::<Vec<_>>(), vec![("b", "2")]);
    assert!(Snapshot::absent().without("a").is_absent());
    assert!(!Snapshot::absent().with("a", "1").is_absent());
}

#[test]
fn threads_are_isolated() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let id = format!("thread-{i}");
                ThreadLocalStore.put(TRACE_ID_KEY, &id);
                for _ in 0..100 {
                    std::thread::yield_now();
                    assert_eq!(current_trace_id().as_deref(), Some(id.as_str()));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn conversions() {
    let mut map = HashMap::new();
    map.insert("traceId".to_string(), "abc".to_string());
    let snapshot = Snapshot::from(map.clone());
    assert_eq!(snapshot.get("traceId"), Some("abc"));
    assert!(Snapshot::from(None::<HashMap<String, String>>).is_absent());
    assert_eq!(Snapshot::from(Some(map)), snapshot);

    let collected: Snapshot = [("x", "1"), ("a", "2")].into_iter().collect();
    assert_eq!(collected.to_string(), "{a=2, x=1}");
}

#[test]
fn trace_flag() {
    ThreadLocalStore.clear();
    assert!(!currently_tracing());
    begin_trace();
    assert!(currently_tracing());
    assert_eq!(current().get(TRACE_FLAG_KEY), Some("1"));
    ThreadLocalStore.clear();
}
