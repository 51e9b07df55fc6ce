//! Absent dicts: `Option<&Dict>` / `Option<Arc<Dict>>` behave like an empty dict.
//!
//! Reads on `None` return what an empty dict would. Writes on `None` are
//! no-ops; nothing is allocated and the caller's option stays `None`.

use crate::dict::{Dict, Items};
use crate::input::Input;
use crate::value::Value;
use core::ops::Deref;

/// Dict operations over a possibly-absent dict.
pub trait MaybeDict {
    fn as_dict(&self) -> Option<&Dict>;

    fn is_empty(&self) -> bool {
        self.as_dict().map_or(true, Dict::is_empty)
    }

    fn len(&self) -> usize {
        self.as_dict().map_or(0, Dict::len)
    }

    fn version(&self) -> u64 {
        self.as_dict().map_or(0, Dict::version)
    }

    fn get(&self, key: impl Into<Value>) -> Option<Value> {
        self.as_dict().and_then(|d| d.get(key))
    }

    fn get_or(&self, key: impl Into<Value>, alt: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| alt.into())
    }

    fn contains_key(&self, key: impl Into<Value>) -> bool {
        self.as_dict().map_or(false, |d| d.contains_key(key))
    }

    fn keys(&self) -> Option<Vec<String>> {
        self.as_dict().and_then(Dict::keys)
    }

    fn values(&self) -> Option<Vec<Value>> {
        self.as_dict().and_then(Dict::values)
    }

    /// Empty iterator when absent.
    fn items(&self) -> Items {
        match self.as_dict() {
            Some(d) => d.items(),
            None => Dict::new().items(),
        }
    }

    fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> Option<&Dict> {
        self.as_dict().map(|d| d.set(key, value))
    }

    fn remove(&self, key: impl Into<Value>) -> bool {
        self.as_dict().map_or(false, |d| d.remove(key))
    }

    fn pop(&self, key: impl Into<Value>) -> Option<Value> {
        self.as_dict().and_then(|d| d.pop(key))
    }

    fn pop_item(&self) -> Option<(String, Value)> {
        self.as_dict().and_then(Dict::pop_item)
    }

    fn clear(&self) -> bool {
        self.as_dict().map_or(false, Dict::clear)
    }

    fn update<I>(&self, inputs: I) -> bool
    where
        I: IntoIterator,
        I::Item: Into<Input>,
    {
        self.as_dict().map_or(false, |d| d.update(inputs))
    }
}

impl<D> MaybeDict for Option<D>
where
    D: Deref<Target = Dict>,
{
    #[inline]
    fn as_dict(&self) -> Option<&Dict> {
        self.as_deref()
    }
}
