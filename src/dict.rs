//! Dict: insertion-ordered, thread-safe dictionary over unified keys.
//!
//! State behind the lock is an order sequence of `Key`s plus a value index
//! keyed by key id. Size and version live outside the lock in atomics so
//! `len()`/`version()` never block. Every mutation is one short critical
//! section; values removed from the structure are dropped after the lock is
//! released.

use crate::input::Input;
use crate::key::{BuildIdHasher, Key};
use crate::reentrancy::DebugReentrancy;
use crate::value::Value;
use core::fmt;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, trace, warn};

struct Inner {
    order: Vec<Key>,
    index: HashMap<u64, Value, BuildIdHasher>,
}

impl Inner {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            order: Vec::with_capacity(capacity),
            index: HashMap::with_capacity_and_hasher(capacity, BuildIdHasher::default()),
        }
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.order.iter().position(|k| k.id() == id)
    }

    /// Remove the entry at `idx`, shifting later entries left. Bounds are
    /// checked against the live order sequence.
    fn remove_at(&mut self, idx: usize) -> Option<(Key, Value)> {
        if idx >= self.order.len() {
            return None;
        }
        let key = self.order.remove(idx);
        let value = self.index.remove(&key.id())?;
        Some((key, value))
    }
}

/// Insertion-ordered dictionary safe to share across threads (`Arc<Dict>`).
pub struct Dict {
    size: AtomicUsize,
    version: AtomicU64,
    inner: RwLock<Inner>,
    reentrancy: DebugReentrancy,
}

impl Dict {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-size the order sequence and value index for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            size: AtomicUsize::new(0),
            version: AtomicU64::new(0),
            inner: RwLock::new(Inner::with_capacity(capacity)),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Build a dict from heterogeneous inputs, applied left to right.
    pub fn from_inputs<I>(inputs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        let d = Self::new();
        d.update(inputs);
        d
    }

    /// Number of entries. Lock-free.
    #[inline]
    pub fn len(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Mutation counter, zero for a fresh dict. Lock-free.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write()
    }

    /// Publish the live length and bump the version. Called with the write
    /// lock held so the counters never drift from the order sequence.
    fn commit(&self, live: usize) {
        self.size.store(live, Ordering::Release);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Insert or replace the value under `key`. Keys the codec rejects are
    /// ignored. Replacing with an equal value keeps the version unchanged.
    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> &Self {
        if let Some(key) = Key::new(&key.into()) {
            self.set_key(key, value.into());
        }
        self
    }

    fn set_key(&self, key: Key, value: Value) {
        let _g = self.reentrancy.enter();
        let mut inner = self.write();
        let Inner { order, index } = &mut *inner;
        let replaced = match index.entry(key.id()) {
            Entry::Occupied(mut slot) => {
                let old = slot.insert(value);
                if old != *slot.get() {
                    self.version.fetch_add(1, Ordering::AcqRel);
                }
                Some(old)
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
                trace!(key = key.name(), "insert");
                order.push(key);
                self.commit(order.len());
                None
            }
        };
        drop(inner);
        drop(replaced);
    }

    /// Clone of the value under `key`.
    pub fn get(&self, key: impl Into<Value>) -> Option<Value> {
        let key = Key::new(&key.into())?;
        let _g = self.reentrancy.enter();
        self.inner.read().index.get(&key.id()).cloned()
    }

    /// Value under `key`, or `alt` when absent.
    pub fn get_or(&self, key: impl Into<Value>, alt: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| alt.into())
    }

    /// Resolved key id and whether it is present. The id is `0` when the
    /// key is rejected by the codec.
    pub fn key_id(&self, key: impl Into<Value>) -> (u64, bool) {
        match Key::new(&key.into()) {
            Some(key) => {
                let _g = self.reentrancy.enter();
                let found = self.inner.read().index.contains_key(&key.id());
                (key.id(), found)
            }
            None => (0, false),
        }
    }

    pub fn contains_key(&self, key: impl Into<Value>) -> bool {
        self.key_id(key).1
    }

    /// Remove `key`. Returns `false` when it was not present.
    ///
    /// O(n): the key is located by a scan of the order sequence, and later
    /// entries shift left to keep insertion order.
    pub fn remove(&self, key: impl Into<Value>) -> bool {
        self.take(key).is_some()
    }

    /// Remove `key` and return its value.
    pub fn pop(&self, key: impl Into<Value>) -> Option<Value> {
        self.take(key).map(|(_, v)| v)
    }

    /// Remove `key` and return its value, or `alt` when absent.
    pub fn pop_or(&self, key: impl Into<Value>, alt: impl Into<Value>) -> Value {
        self.pop(key).unwrap_or_else(|| alt.into())
    }

    fn take(&self, key: impl Into<Value>) -> Option<(Key, Value)> {
        let key = Key::new(&key.into())?;
        let _g = self.reentrancy.enter();
        let mut inner = self.write();
        if !inner.index.contains_key(&key.id()) {
            return None;
        }
        let idx = inner.position(key.id())?;
        let removed = inner.remove_at(idx)?;
        trace!(key = key.name(), "remove");
        self.commit(inner.order.len());
        drop(inner);
        Some(removed)
    }

    /// Remove and return the most recently inserted entry.
    pub fn pop_item(&self) -> Option<(String, Value)> {
        let _g = self.reentrancy.enter();
        let mut inner = self.write();
        let live = inner.order.len();
        let cached = self.len();
        if cached != live {
            warn!(cached, live, "size counter drifted from order sequence");
        }
        let (key, value) = inner.remove_at(live.checked_sub(1)?)?;
        trace!(key = key.name(), "pop item");
        self.commit(inner.order.len());
        drop(inner);
        Some((key.into_name(), value))
    }

    /// Remove every entry. Returns `false` if the dict was already empty.
    /// The version moves by exactly one.
    pub fn clear(&self) -> bool {
        let _g = self.reentrancy.enter();
        let mut inner = self.write();
        if inner.order.is_empty() {
            return false;
        }
        let order = core::mem::take(&mut inner.order);
        let index = core::mem::take(&mut inner.index);
        self.commit(inner.order.len());
        drop(inner);
        debug!(dropped = order.len(), "clear");
        drop((order, index));
        true
    }

    /// Canonical key names in insertion order, `None` when empty.
    pub fn keys(&self) -> Option<Vec<String>> {
        let _g = self.reentrancy.enter();
        let inner = self.inner.read();
        if inner.order.is_empty() {
            return None;
        }
        Some(inner.order.iter().map(|k| k.name().to_owned()).collect())
    }

    /// Values aligned with `keys()`, `None` when empty.
    pub fn values(&self) -> Option<Vec<Value>> {
        let _g = self.reentrancy.enter();
        let inner = self.inner.read();
        if inner.order.is_empty() {
            return None;
        }
        Some(
            inner
                .order
                .iter()
                .filter_map(|k| inner.index.get(&k.id()).cloned())
                .collect(),
        )
    }

    /// Snapshot of the entries at the moment of the call.
    ///
    /// The lock is held only while the snapshot is copied. The returned
    /// iterator owns its data, so consumers may freely mutate this dict
    /// while draining it.
    pub fn items(&self) -> Items {
        let snapshot: Vec<(String, Value)> = {
            let _g = self.reentrancy.enter();
            let inner = self.inner.read();
            inner
                .order
                .iter()
                .filter_map(|k| {
                    inner
                        .index
                        .get(&k.id())
                        .map(|v| (k.name().to_owned(), v.clone()))
                })
                .collect()
        };
        Items {
            it: snapshot.into_iter(),
        }
    }

    /// Merge every input into this dict, one `set` per pair. Pairs without a
    /// key are keyed by the dict's length at the time they are written.
    /// Returns whether the version changed.
    pub fn update<I>(&self, inputs: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        let before = self.version();
        for input in inputs {
            for (key, value) in input.into().pairs() {
                let key = key.unwrap_or_else(|| Value::from(self.len()));
                self.set(key, value);
            }
        }
        before != self.version()
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Dict {
    /// `(order length, index length, every ordered id is unique and indexed)`.
    pub(crate) fn structure(&self) -> (usize, usize, bool) {
        let inner = self.inner.read();
        let sound = inner.order.iter().enumerate().all(|(i, k)| {
            inner.index.contains_key(&k.id())
                && !inner.order[..i].iter().any(|o| o.id() == k.id())
        });
        (inner.order.len(), inner.index.len(), sound)
    }
}

/// Owned snapshot iterator returned by `Dict::items`.
pub struct Items {
    it: std::vec::IntoIter<(String, Value)>,
}

impl Iterator for Items {
    type Item = (String, Value);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl DoubleEndedIterator for Items {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back()
    }
}

impl ExactSizeIterator for Items {}

impl<K, V> FromIterator<(K, V)> for Dict
where
    K: Into<Value>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let d = Dict::new();
        for (k, v) in iter {
            d.set(k, v);
        }
        d
    }
}

/// `{name: value, ...}` in insertion order, values in their verbose form.
impl fmt::Display for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.items().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {:?}", name, value)?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.items()).finish()
    }
}

/// Build a `Dict` from heterogeneous inputs: `dict![vec![1, 2], ("k", "v"), 3.5]`.
#[macro_export]
macro_rules! dict {
    () => {
        $crate::Dict::new()
    };
    ($($input:expr),+ $(,)?) => {
        $crate::Dict::from_inputs([$($crate::Input::from($input)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn abc() -> Dict {
        let d = Dict::new();
        d.set("a", 1).set("b", 2).set("c", 3);
        d
    }

    /// Invariant: counters equal the live order length after every operation.
    fn assert_consistent(d: &Dict) {
        let (order, index, sound) = d.structure();
        assert_eq!(d.len(), order);
        assert_eq!(order, index);
        assert!(sound);
    }

    #[test]
    fn set_appends_and_bumps() {
        let d = Dict::new();
        assert_eq!(d.version(), 0);
        d.set("a", 1);
        assert_eq!((d.len(), d.version()), (1, 1));
        d.set("b", 2);
        assert_eq!((d.len(), d.version()), (2, 2));
        assert_consistent(&d);
    }

    #[test]
    fn replace_keeps_position() {
        let d = abc();
        d.set("a", 10);
        assert_eq!(d.keys().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(d.get("a"), Some(Value::Int(10)));
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn equal_replacement_keeps_version() {
        let d = abc();
        let v = d.version();
        d.set("b", 2);
        assert_eq!(d.version(), v);
        d.set("b", 2.0);
        assert_eq!(d.version(), v + 1, "Int(2) and Float(2.0) differ");
        assert_eq!(d.get("b"), Some(Value::Float(2.0)));
    }

    #[test]
    fn rejected_keys_are_ignored() {
        let d = abc();
        let v = d.version();
        d.set(Value::Null, 1).set("", 2).set(true, 3).set(Value::opaque(()), 4);
        assert_eq!((d.len(), d.version()), (3, v));
        assert_eq!(d.key_id(Value::Null), (0, false));
        assert!(d.get(Value::Null).is_none());
    }

    #[test]
    fn key_id_reports_id_even_when_missing() {
        let d = abc();
        let (id, found) = d.key_id("zz");
        assert!(!found);
        assert_eq!(id, crate::key::fnv1a64(b"zz"));
        assert_eq!(d.key_id("a"), (crate::key::fnv1a64(b"a"), true));
    }

    #[test]
    fn get_or_uses_alternate_only_on_miss() {
        let d = abc();
        assert_eq!(d.get_or("a", 0), Value::Int(1));
        assert_eq!(d.get_or("zz", "fallback"), Value::from("fallback"));
    }

    #[test]
    fn remove_compacts_order() {
        let d = abc();
        let v = d.version();
        assert!(d.remove("b"));
        assert!(!d.remove("b"));
        assert_eq!(d.keys().unwrap(), vec!["a", "c"]);
        assert_eq!(d.version(), v + 1);
        assert_consistent(&d);
    }

    #[test]
    fn pop_returns_value_once() {
        let d = abc();
        assert_eq!(d.pop("a"), Some(Value::Int(1)));
        assert_eq!(d.pop("a"), None);
        assert_eq!(d.pop_or("a", -1), Value::Int(-1));
        assert_eq!(d.len(), 2);
        assert_consistent(&d);
    }

    #[test]
    fn pop_item_is_lifo() {
        let d = abc();
        assert_eq!(d.pop_item(), Some(("c".into(), Value::Int(3))));
        assert_eq!(d.pop_item(), Some(("b".into(), Value::Int(2))));
        assert_eq!(d.pop_item(), Some(("a".into(), Value::Int(1))));
        assert_eq!(d.pop_item(), None);
        assert_consistent(&d);
    }

    /// Invariant: `pop_item` bounds come from the order sequence, not the counter.
    #[test]
    fn pop_item_survives_counter_drift() {
        let d = abc();
        d.size.store(10, Ordering::Release);
        assert_eq!(d.pop_item().map(|(k, _)| k), Some("c".into()));
        assert_eq!(d.len(), 2);

        let e = Dict::new();
        e.size.store(3, Ordering::Release);
        assert_eq!(e.pop_item(), None);
    }

    #[test]
    fn clear_bumps_version_once() {
        let d = abc();
        let v = d.version();
        assert!(d.clear());
        assert_eq!(d.version(), v + 1);
        assert!(d.is_empty());
        assert!(!d.clear());
        assert_eq!(d.version(), v + 1);
        assert!(d.keys().is_none());
        assert!(d.values().is_none());
        assert_consistent(&d);
    }

    #[test]
    fn items_are_a_snapshot() {
        let d = abc();
        let items = d.items();
        d.clear();
        d.set("z", 26);
        let seen: Vec<_> = items.map(|(k, _)| k).collect();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn items_iterate_from_both_ends() {
        let d = abc();
        let mut items = d.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items.next_back().map(|(k, _)| k), Some("c".into()));
        assert_eq!(items.next().map(|(k, _)| k), Some("a".into()));
        assert_eq!(items.len(), 1);
        let newest_first: Vec<_> = d.items().rev().map(|(k, _)| k).collect();
        assert_eq!(newest_first, vec!["c", "b", "a"]);
    }

    /// Invariant: an equal replacement keeps the version but still stores the new value.
    #[test]
    fn equal_replacement_still_writes() {
        let d = Dict::new();
        let a = Arc::new(dict![("x", 1)]);
        let b = Arc::new(dict![("x", 1)]);
        d.set("c", Arc::clone(&a));
        let v = d.version();
        d.set("c", Arc::clone(&b));
        assert_eq!(d.version(), v);
        let stored = d.get("c").unwrap();
        assert!(Arc::ptr_eq(stored.as_dict().unwrap(), &b));
        assert!(!Arc::ptr_eq(stored.as_dict().unwrap(), &a));
    }

    #[test]
    fn mutate_while_draining_items() {
        let d = abc();
        for (k, _) in d.items() {
            assert!(d.pop_item().is_some());
            d.set(format!("{}{}", k, k), 0);
        }
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn update_numbers_positional_keys_from_len() {
        let d = Dict::new();
        d.update([1, 2]);
        d.update([3]);
        assert_eq!(d.keys().unwrap(), vec!["0", "1", "2"]);
        assert!(!d.update(Vec::<Input>::new()));
        assert!(!d.update([Value::Null]));
    }

    #[test]
    fn update_from_self_is_a_no_op() {
        let d = Arc::new(abc());
        let v = d.version();
        assert!(!d.update([Arc::clone(&d)]));
        assert_eq!(d.version(), v);
    }

    #[test]
    fn macro_builds_from_mixed_inputs() {
        let d = dict![vec![1, 2, 3], ("k", "v"), 4.5];
        assert_eq!(d.keys().unwrap(), vec!["0", "1", "2", "k", "4"]);
        assert_eq!(d.get(4), Some(Value::Float(4.5)));
        assert!(dict![].is_empty());
    }

    #[test]
    fn display_matches_insertion_order() {
        assert_eq!(Dict::new().to_string(), "{}");
        assert_eq!(dict![vec![1, 2, 3]].to_string(), "{0: 1, 1: 2, 2: 3}");
        assert_eq!(dict![vec![1.1, 2.2, 3.3]].to_string(), "{0: 1.1, 1: 2.2, 2: 3.3}");
        let d = Dict::new();
        d.set("name", "x").set("nested", dict![7]);
        assert_eq!(d.to_string(), "{name: \"x\", nested: {0: 7}}");
    }

    #[cfg(debug_assertions)]
    #[test]
    fn self_nesting_compare_panics_instead_of_hanging() {
        let d = Arc::new(Dict::new());
        d.set("me", Arc::clone(&d));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            d.set("me", Dict::new());
        }));
        assert!(res.is_err());
        // The lock was released during unwinding.
        assert_eq!(d.len(), 1);
        d.remove("me");
    }
}
