//! Iterable adapter: normalizes bulk inputs into `(Option<Value>, Value)` pairs.
//!
//! | Input            | Pairs                                              |
//! |------------------|----------------------------------------------------|
//! | `Empty`          | none                                               |
//! | `Pair(k, v)`     | `(Some(k), v)`                                     |
//! | `Mapping`        | `(Some(k), v)` per entry, in the map's own order   |
//! | `Stream`         | `(None, v)` per received value until the sender closes |
//! | `Sequence`       | `(Some(i), v)` with `i` the zero-based position    |
//! | `Scalar(v)`      | `(None, v)`                                        |
//! | `Dict(d)`        | `(Some(name), v)` from a snapshot of `d.items()`   |
//!
//! Keys are not validated here; the dict skips pairs whose key it rejects.
//! A `None` key is filled in by the dict with its length at insertion time.

use crate::dict::{Dict, Items};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// One bulk input for `Dict::update` and friends.
pub enum Input {
    Empty,
    Pair(Value, Value),
    Mapping(Box<dyn Iterator<Item = (Value, Value)> + Send>),
    Stream(Box<dyn Iterator<Item = Value> + Send>),
    Sequence(Vec<Value>),
    Scalar(Value),
    Dict(Arc<Dict>),
}

impl Input {
    /// A mapping input from any iterator of key/value pairs.
    pub fn mapping<I, K, V>(entries: I) -> Input
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: Send + 'static,
        K: Into<Value>,
        V: Into<Value>,
    {
        Input::Mapping(Box::new(
            entries.into_iter().map(|(k, v)| (k.into(), v.into())),
        ))
    }

    /// A push-style stream input. Draining it blocks until the next value
    /// arrives and ends once every sender has been dropped.
    pub fn stream<T>(rx: Receiver<T>) -> Input
    where
        T: Into<Value> + Send + 'static,
    {
        Input::Stream(Box::new(rx.into_iter().map(Into::into)))
    }

    /// Lazily produce the pairs for this input.
    pub fn pairs(self) -> Pairs {
        let state = match self {
            Input::Empty => State::Done,
            Input::Pair(k, v) => State::One(Some((Some(k), v))),
            Input::Scalar(v) => State::One(Some((None, v))),
            Input::Mapping(it) => State::Mapping(it),
            Input::Stream(it) => State::Stream(it),
            Input::Sequence(v) => State::Sequence(v.into_iter().enumerate()),
            Input::Dict(d) => State::Dict(d.items()),
        };
        Pairs { state }
    }
}

/// Single-pass iterator over the pairs of one `Input`.
pub struct Pairs {
    state: State,
}

enum State {
    Done,
    One(Option<(Option<Value>, Value)>),
    Mapping(Box<dyn Iterator<Item = (Value, Value)> + Send>),
    Stream(Box<dyn Iterator<Item = Value> + Send>),
    Sequence(std::iter::Enumerate<std::vec::IntoIter<Value>>),
    Dict(Items),
}

impl Iterator for Pairs {
    type Item = (Option<Value>, Value);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            State::Done => None,
            State::One(slot) => slot.take(),
            State::Mapping(it) => it.next().map(|(k, v)| (Some(k), v)),
            State::Stream(it) => it.next().map(|v| (None, v)),
            State::Sequence(it) => it.next().map(|(i, v)| (Some(Value::from(i)), v)),
            State::Dict(it) => it.next().map(|(k, v)| (Some(Value::String(k)), v)),
        }
    }
}

/// Sequences and dicts keep their shape; `Null` is empty; the rest are scalars.
impl From<Value> for Input {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Input::Empty,
            Value::List(l) => Input::Sequence(l),
            Value::Bools(l) => Input::Sequence(l.into_iter().map(Value::Bool).collect()),
            Value::Floats(l) => Input::Sequence(l.into_iter().map(Value::Float).collect()),
            Value::Strings(l) => Input::Sequence(l.into_iter().map(Value::String).collect()),
            Value::Dict(d) => Input::Dict(d),
            other => Input::Scalar(other),
        }
    }
}

macro_rules! impl_scalar_input {
    ($($t:ty),+) => {
        $(
            impl From<$t> for Input {
                #[inline]
                fn from(v: $t) -> Self {
                    Input::Scalar(Value::from(v))
                }
            }
        )+
    };
}

impl_scalar_input!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char, String
);

impl From<&str> for Input {
    fn from(v: &str) -> Self {
        Input::Scalar(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Input {
    fn from(v: Vec<T>) -> Self {
        Input::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Input {
    fn from(v: [T; N]) -> Self {
        Input::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<K, V> From<(K, V)> for Input
where
    K: Into<Value>,
    V: Into<Value>,
{
    fn from((k, v): (K, V)) -> Self {
        Input::Pair(k.into(), v.into())
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Input
where
    K: Into<Value> + Send + 'static,
    V: Into<Value> + Send + 'static,
    S: Send + 'static,
{
    fn from(m: HashMap<K, V, S>) -> Self {
        Input::mapping(m)
    }
}

impl<K, V> From<BTreeMap<K, V>> for Input
where
    K: Into<Value> + Send + 'static,
    V: Into<Value> + Send + 'static,
{
    fn from(m: BTreeMap<K, V>) -> Self {
        Input::mapping(m)
    }
}

impl<T> From<Receiver<T>> for Input
where
    T: Into<Value> + Send + 'static,
{
    fn from(rx: Receiver<T>) -> Self {
        Input::stream(rx)
    }
}

impl From<Arc<Dict>> for Input {
    fn from(d: Arc<Dict>) -> Self {
        Input::Dict(d)
    }
}

impl From<&Arc<Dict>> for Input {
    fn from(d: &Arc<Dict>) -> Self {
        Input::Dict(Arc::clone(d))
    }
}

impl From<Dict> for Input {
    fn from(d: Dict) -> Self {
        Input::Dict(Arc::new(d))
    }
}

impl<T: Into<Input>> From<Option<T>> for Input {
    fn from(v: Option<T>) -> Self {
        v.map_or(Input::Empty, Into::into)
    }
}
