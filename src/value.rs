//! Value model: a closed sum type for everything a `Dict` can store.
//!
//! ## Equality
//!
//! Equality is structural and type-strict, so `Int(1) != Uint(1) != Float(1.0)`.
//! Floats follow IEEE-754 (`NaN != NaN`). Nested dicts are equal when they
//! are the same instance or when their item snapshots are equal.
//! `Described` values compare by rendered text and `Opaque` values by
//! identity.

use crate::dict::Dict;
use core::any::Any;
use core::fmt;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

/// A stored value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// Any signed integer width.
    Int(i64),
    /// Any unsigned integer width.
    Uint(u64),
    /// Any float width.
    Float(f64),
    String(String),
    /// Typed sequences produced by the JSON decoder for homogeneous arrays.
    Bools(Vec<bool>),
    Floats(Vec<f64>),
    Strings(Vec<String>),
    /// Heterogeneous sequence.
    List(Vec<Value>),
    /// Nested dictionary, shared by reference.
    Dict(Arc<Dict>),
    /// A value that renders itself as text; usable as a key.
    Described(Described),
    /// Anything else. Storable, never a key, not serializable.
    Opaque(Opaque),
}

impl Value {
    /// Wrap a self-describing value.
    pub fn described<T>(value: T) -> Value
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Value::Described(Described(Arc::new(value)))
    }

    /// Wrap an arbitrary value in an opaque slot.
    pub fn opaque<T>(value: T) -> Value
    where
        T: Any + Send + Sync,
    {
        Value::Opaque(Opaque {
            inner: Arc::new(value),
            type_name: core::any::type_name::<T>(),
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Uint(_) => "Uint",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bools(_) => "Bools",
            Value::Floats(_) => "Floats",
            Value::Strings(_) => "Strings",
            Value::List(_) => "List",
            Value::Dict(_) => "Dict",
            Value::Described(_) => "Described",
            Value::Opaque(_) => "Opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Arc<Dict>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }
}

/// Self-describing value slot.
#[derive(Clone)]
pub struct Described(Arc<dyn fmt::Display + Send + Sync>);

impl fmt::Display for Described {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for Described {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

/// Opaque value slot. Equality is identity of the shared allocation.
#[derive(Clone)]
pub struct Opaque {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Opaque {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Uint(a), Value::Uint(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bools(a), Value::Bools(b)) => a == b,
            (Value::Floats(a), Value::Floats(b)) => a == b,
            (Value::Strings(a), Value::Strings(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => Arc::ptr_eq(a, b) || a.items().eq(b.items()),
            (Value::Described(a), Value::Described(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

/// Verbose form, used by `Dict`'s `Display`: strings are quoted, numbers bare.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bools(v) => f.debug_list().entries(v).finish(),
            Value::Floats(v) => f
                .debug_list()
                .entries(v.iter().map(|x| Value::Float(*x)))
                .finish(),
            Value::Strings(v) => f.debug_list().entries(v).finish(),
            Value::List(v) => f.debug_list().entries(v).finish(),
            Value::Dict(d) => write!(f, "{}", d),
            Value::Described(d) => write!(f, "{}", d),
            Value::Opaque(o) => write!(f, "<{}>", o.type_name),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

macro_rules! impl_from {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::$variant(v as $target)
                }
            }
        )+
    };
}

impl_from!(Int as i64: i8, i16, i32, i64, isize);
impl_from!(Uint as u64: u8, u16, u32, u64, usize);
impl_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::String(c.to_string())
    }
}

impl From<Arc<Dict>> for Value {
    fn from(d: Arc<Dict>) -> Self {
        Value::Dict(d)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Value::Dict(Arc::new(d))
    }
}

impl From<Described> for Value {
    fn from(d: Described) -> Self {
        Value::Described(d)
    }
}

impl From<Opaque> for Value {
    fn from(o: Opaque) -> Self {
        Value::Opaque(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

/// Maps become nested dicts, in the map's own enumeration order.
impl<K, V, S> From<HashMap<K, V, S>> for Value
where
    K: Into<Value>,
    V: Into<Value>,
{
    fn from(m: HashMap<K, V, S>) -> Self {
        Value::Dict(Arc::new(m.into_iter().collect()))
    }
}

impl<K, V> From<BTreeMap<K, V>> for Value
where
    K: Into<Value>,
    V: Into<Value>,
{
    fn from(m: BTreeMap<K, V>) -> Self {
        Value::Dict(Arc::new(m.into_iter().collect()))
    }
}
