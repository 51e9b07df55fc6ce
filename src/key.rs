//! Key codec: canonical `(id, name)` identities for dictionary keys.
//!
//! A key is accepted only if it falls into one of a closed set of
//! categories: signed integer, unsigned integer, float, string, or a
//! self-describing value (`Value::Described`, or a nested `Value::Dict`
//! through its `Display` rendering). Everything else, including
//! `Value::Null`, is rejected at this boundary. The canonical name is the
//! value's text; the id is the 64-bit FNV-1a hash of that text, so `123`
//! and `"123"` land on the same slot.

use crate::value::Value;
use core::fmt;
use core::hash::{BuildHasherDefault, Hasher};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a 64-bit over `bytes`. Stable across platforms and runs.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Canonical identity of a key.
///
/// Invariant: `id() == fnv1a64(name().as_bytes())` and `name()` is never empty.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Key {
    id: u64,
    name: String,
}

impl Key {
    /// Resolve `value` into a key, or `None` if it cannot act as one.
    pub fn new(value: &Value) -> Option<Key> {
        let name = canonical_name(value)?;
        if name.is_empty() {
            return None;
        }
        Some(Key {
            id: fnv1a64(name.as_bytes()),
            name,
        })
    }

    /// Convenience for `Key::new(&value.into())`.
    pub fn from_value(value: impl Into<Value>) -> Option<Key> {
        Key::new(&value.into())
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_name(self) -> String {
        self.name
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

fn canonical_name(value: &Value) -> Option<String> {
    match value {
        Value::Int(i) => Some(i.to_string()),
        Value::Uint(u) => Some(u.to_string()),
        Value::Float(x) => Some(float_name(*x)),
        Value::String(s) => Some(s.clone()),
        Value::Described(d) => Some(d.to_string()),
        Value::Dict(d) => Some(d.to_string()),
        _ => None,
    }
}

fn float_name(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_owned()
    } else if x.is_infinite() {
        if x > 0.0 { "+Inf" } else { "-Inf" }.to_owned()
    } else {
        // Shortest round-tripping decimal, never in exponent notation.
        x.to_string()
    }
}

/// Pass-through hasher for the value index. Ids are already FNV hashes, so
/// `write_u64` stores the id verbatim instead of hashing it again.
#[derive(Clone, Copy, Debug)]
pub struct IdHasher(u64);

impl Default for IdHasher {
    fn default() -> Self {
        IdHasher(FNV_OFFSET)
    }
}

impl Hasher for IdHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    #[inline]
    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
}

pub type BuildIdHasher = BuildHasherDefault<IdHasher>;
