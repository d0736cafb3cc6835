// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable point-in-time copies of a context.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::Arc;

/// An immutable copy of an execution path's diagnostic context.
///
/// A snapshot is either *absent* (no context was installed at all) or a map
/// of zero or more entries. The two are different: installing an absent
/// snapshot clears the target path entirely, while installing an empty one
/// leaves the path with a context that simply has no keys.
///
/// Cloning is cheap because the entries are shared immutably. Every way of
/// deriving a new snapshot copies on write, so a snapshot handed to another
/// thread never changes underneath it.
///
/// ```rust
/// use tracewise::context::Snapshot;
///
/// let absent = Snapshot::absent();
/// assert!(absent.is_absent());
///
/// let request = Snapshot::empty().with("traceId", "abc123");
/// let tagged = request.with("user", "alice");
/// assert_eq!(request.len(), 1);
/// assert_eq!(tagged.get("user"), Some("alice"));
/// assert_eq!(tagged.to_string(), "{traceId=abc123, user=alice}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Snapshot {
    entries: Option<Arc<BTreeMap<String, String>>>,
}

impl Snapshot {
    /// The marker for "no context was installed".
    pub const fn absent() -> Self {
        Snapshot { entries: None }
    }

    /// A present context with no entries.
    pub fn empty() -> Self {
        Snapshot {
            entries: Some(Arc::new(BTreeMap::new())),
        }
    }

    #[inline]
    pub fn is_absent(&self) -> bool {
        self.entries.is_none()
    }

    /// True for absent snapshots and for present ones without entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, |e| e.len())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .as_ref()
            .and_then(|e| e.get(key))
            .map(String::as_str)
    }

    /// Entries in key order. Absent snapshots yield nothing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|e| e.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A new snapshot with `key` set to `value`. An absent snapshot becomes present.
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Snapshot {
        let mut entries = self.entries.clone().unwrap_or_default();
        Arc::make_mut(&mut entries).insert(key.into(), value.into());
        Snapshot {
            entries: Some(entries),
        }
    }

    /// A new snapshot without `key`. Removing from an absent snapshot keeps it absent.
    pub fn without(&self, key: &str) -> Snapshot {
        match &self.entries {
            None => Snapshot::absent(),
            Some(entries) if !entries.contains_key(key) => self.clone(),
            Some(entries) => {
                let mut entries = entries.clone();
                Arc::make_mut(&mut entries).remove(key);
                Snapshot {
                    entries: Some(entries),
                }
            }
        }
    }

    /// An owned copy of the entries, or `None` for an absent snapshot.
    pub fn to_map(&self) -> Option<BTreeMap<String, String>> {
        self.entries.as_deref().cloned()
    }
}

impl Display for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(entries) = &self.entries else {
            return write!(f, "-");
        };
        write!(f, "{{")?;
        for (i, (k, v)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Snapshot {
            entries: Some(Arc::new(
                iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            )),
        }
    }
}

impl From<BTreeMap<String, String>> for Snapshot {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Snapshot {
            entries: Some(Arc::new(entries)),
        }
    }
}

impl From<HashMap<String, String>> for Snapshot {
    fn from(entries: HashMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<Option<HashMap<String, String>>> for Snapshot {
    fn from(entries: Option<HashMap<String, String>>) -> Self {
        entries.map_or_else(Snapshot::absent, Snapshot::from)
    }
}
