//! ordict: an insertion-ordered, thread-safe dictionary whose keys unify
//! across primitive types.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a dictionary that remembers insertion order, treats `123` and
//!   `"123"` as the same key, reports a version that moves exactly when
//!   its contents change, and can be shared across threads without
//!   deadlocking readers against writers.
//! - Layers:
//!   - Key codec (`key`): turns a `Value` into a canonical `Key`
//!     `(id, name)`, where `name` is the value's text and `id` is its
//!     FNV-1a hash. Only integers, floats, strings and self-describing
//!     values qualify.
//!   - Iterable adapter (`Input`): normalizes scalars, sequences, maps,
//!     channels and other dicts into `(Option<Value>, Value)` pairs.
//!   - Ordered container (`Dict`): an order sequence of keys plus a value
//!     index keyed by id, behind one `RwLock`, with lock-free size and
//!     version counters.
//!   - Codec adapter (`json`, feature `json`): serde encode/decode on top
//!     of the container's public API.
//!
//! Constraints
//! - `Dict: Send + Sync`; share it as `Arc<Dict>`. All operations take
//!   `&self`.
//! - Each mutation is its own critical section. Bulk `update` is not
//!   atomic; readers may observe partial progress.
//! - `len()` and `version()` are atomic loads and never take the lock.
//! - `items()` copies a snapshot under a short read lock and then streams
//!   from the copy, so a consumer may mutate the dict mid-iteration.
//! - Deletion is O(n): a scan of the order sequence and a compacting
//!   shift. Append, lookup and positional iteration are O(1).
//! - Hash collisions between distinct names are not defended against.
//!
//! Why this split?
//! - Localize invariants: the codec is pure, the adapter never touches a
//!   dict, and every counter update happens inside the container's write
//!   lock.
//! - Clear failure boundaries: the container has no error surface
//!   (rejected keys are no-ops, misses are `None`); only the JSON boundary
//!   returns `Result`.
//!
//! Reentrancy policy
//! - The lock is never held while user code could reenter the same dict,
//!   with one exception: value equality during `set` may read nested
//!   dicts. A dict nested inside itself therefore self-deadlocks on
//!   replacement. In debug builds a per-thread reentrancy guard turns
//!   that into a panic; in release builds it is a no-op.
//! - Values removed by `remove`, `pop`, `pop_item` and `clear` are dropped
//!   after the lock is released.
//!
//! Counter invariants
//! - `len() == order.len() == index.len()` whenever no write is in flight.
//! - `version()` is non-decreasing: +1 per insert, per removal, per
//!   replacement with an unequal value, and exactly +1 per non-empty
//!   `clear`.
//! - Bounds-sensitive operations (`pop_item`, positional removal) check
//!   the live order sequence, never the cached size.
//!
//! Notes and non-goals
//! - No persistence, no multi-key transactions, no range queries, no
//!   ordering other than insertion order.
//! - No cycle protection for nested dicts.
//! - `Option<&Dict>` and `Option<Arc<Dict>>` act as empty dicts through
//!   `MaybeDict`.

mod absent;
mod dict;
mod dict_proptest;
mod error;
mod input;
pub mod key;
mod reentrancy;
mod value;

#[cfg(feature = "json")]
mod json;

// Public surface
pub use absent::MaybeDict;
pub use dict::{Dict, Items};
pub use error::{Error, Result};
pub use input::{Input, Pairs};
pub use key::{fnv1a64, Key};
pub use value::{Described, Opaque, Value};
