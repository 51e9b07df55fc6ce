//! JSON codec for `Dict` and `Value`, built on the dict's public contract.
//!
//! Encoding: a dict is a flat object keyed by canonical names, in insertion
//! order; an empty dict is `null`. Nested dicts become nested objects.
//! `Opaque` values and non-finite floats cannot be encoded.
//!
//! Decoding: the top level must be an object (or `null`, which decodes to
//! nothing). Numbers decode as floats. Arrays whose non-null elements share
//! one primitive kind become typed sequences, with `null` elements replaced
//! by the kind's zero value; any other array stays a `List`. Nested objects
//! become nested dicts. The whole text is parsed and converted before the
//! first `set`, so malformed input never touches the target dict.

use crate::dict::Dict;
use crate::error::{Error, Result};
use crate::input::Input;
use crate::value::Value;
use serde::de::Error as _;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::debug;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => s.serialize_unit(),
            Value::Bool(b) => s.serialize_bool(*b),
            Value::Int(i) => s.serialize_i64(*i),
            Value::Uint(u) => s.serialize_u64(*u),
            Value::Float(x) => Finite(*x).serialize(s),
            Value::String(x) => s.serialize_str(x),
            Value::Bools(v) => v.serialize(s),
            Value::Floats(v) => {
                let mut seq = s.serialize_seq(Some(v.len()))?;
                for x in v {
                    seq.serialize_element(&Finite(*x))?;
                }
                seq.end()
            }
            Value::Strings(v) => v.serialize(s),
            Value::List(v) => v.serialize(s),
            Value::Dict(d) => d.as_ref().serialize(s),
            Value::Described(d) => s.collect_str(d),
            Value::Opaque(o) => Err(S::Error::custom(format!(
                "value of type {} has no JSON representation",
                o.type_name()
            ))),
        }
    }
}

struct Finite(f64);

impl Serialize for Finite {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.0.is_finite() {
            return Err(S::Error::custom(format!(
                "non-finite float {} has no JSON representation",
                self.0
            )));
        }
        s.serialize_f64(self.0)
    }
}

impl Serialize for Dict {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        let items = self.items();
        if items.len() == 0 {
            return s.serialize_none();
        }
        let mut map = s.serialize_map(Some(items.len()))?;
        for (name, value) in items {
            map.serialize_entry(&name, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Dict {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let entries = object_entries(Json::deserialize(d)?).map_err(D::Error::custom)?;
        Ok(Dict::from_inputs([Input::mapping(entries)]))
    }
}

impl Dict {
    /// Encode as a JSON object, or `null` when empty.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Encode(e.to_string()))
    }

    /// Decode a JSON object into a new dict.
    pub fn from_json(text: &str) -> Result<Dict> {
        let d = Dict::new();
        d.update_json(text)?;
        Ok(d)
    }

    /// Merge a JSON object into this dict. Returns whether the version changed.
    pub fn update_json(&self, text: &str) -> Result<bool> {
        let entries = object_entries(serde_json::from_str(text)?)?;
        debug!(entries = entries.len(), "decoded json object");
        Ok(self.update([Input::mapping(entries)]))
    }
}

fn object_entries(json: Json) -> Result<Vec<(String, Value)>> {
    match json {
        Json::Null => Ok(Vec::new()),
        Json::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, from_json_value(v)))
            .collect()),
        other => Err(Error::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn from_json_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => n.as_f64().map_or(Value::Null, Value::Float),
        Json::String(s) => Value::String(s),
        Json::Array(items) => from_json_array(items),
        Json::Object(map) => Value::Dict(Arc::new(
            map.into_iter()
                .map(|(k, v)| (k, from_json_value(v)))
                .collect(),
        )),
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Kind {
    Bool,
    Number,
    String,
}

/// The single primitive kind shared by every non-null element, if any.
fn array_kind(items: &[Json]) -> Option<Kind> {
    let mut seen = None;
    for item in items {
        let kind = match item {
            Json::Null => continue,
            Json::Bool(_) => Kind::Bool,
            Json::Number(_) => Kind::Number,
            Json::String(_) => Kind::String,
            Json::Array(_) | Json::Object(_) => return None,
        };
        match seen {
            None => seen = Some(kind),
            Some(k) if k != kind => return None,
            Some(_) => {}
        }
    }
    seen
}

fn from_json_array(items: Vec<Json>) -> Value {
    match array_kind(&items) {
        Some(Kind::Bool) => Value::Bools(
            items
                .iter()
                .map(|j| j.as_bool().unwrap_or_default())
                .collect(),
        ),
        Some(Kind::Number) => Value::Floats(
            items
                .iter()
                .map(|j| j.as_f64().unwrap_or_default())
                .collect(),
        ),
        Some(Kind::String) => Value::Strings(
            items
                .into_iter()
                .map(|j| match j {
                    Json::String(s) => s,
                    _ => String::new(),
                })
                .collect(),
        ),
        None => Value::List(items.into_iter().map(from_json_value).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict;
    use std::collections::HashMap;

    fn assert_json_eq(actual: &str, expected: &str) {
        let a: Json = serde_json::from_str(actual).unwrap();
        let e: Json = serde_json::from_str(expected).unwrap();
        assert_eq!(a, e, "{} != {}", actual, expected);
    }

    #[test]
    fn encode_shapes() {
        let cases: Vec<(Dict, &str)> = vec![
            (Dict::new(), "null"),
            (dict![1], r#"{"0":1}"#),
            (dict![2.2], r#"{"0":2.2}"#),
            (dict!["2.2"], r#"{"0":"2.2"}"#),
            (dict![300u32], r#"{"0":300}"#),
            (dict![vec![1, 2, 3]], r#"{"0":1,"1":2,"2":3}"#),
            (dict![vec![vec![1, 2, 3]]], r#"{"0":[1,2,3]}"#),
            (
                dict![HashMap::from([("one item", 1)])],
                r#"{"one item":1}"#,
            ),
        ];
        for (d, expected) in cases {
            assert_json_eq(&d.to_json().unwrap(), expected);
        }
    }

    #[test]
    fn encode_keeps_insertion_order() {
        let d = Dict::new();
        d.set("z", 1).set("a", 2).set(10, 3);
        assert_eq!(d.to_json().unwrap(), r#"{"z":1,"a":2,"10":3}"#);
    }

    #[test]
    fn encode_nested() {
        let d = dict![vec![1, 2, 3]];
        d.set(d.len(), dict![vec![4, 5, 6]]);
        d.set("empty", Dict::new());
        assert_json_eq(
            &d.to_json().unwrap(),
            r#"{"0":1,"1":2,"2":3,"3":{"0":4,"1":5,"2":6},"empty":null}"#,
        );
    }

    #[test]
    fn encode_described_as_text() {
        let d = Dict::new();
        d.set("id", Value::described(0x2a));
        assert_eq!(d.to_json().unwrap(), r#"{"id":"42"}"#);
    }

    #[test]
    fn encode_rejects_opaque_and_non_finite() {
        let d = Dict::new();
        d.set("x", Value::opaque(|| ()));
        assert!(matches!(d.to_json(), Err(Error::Encode(_))));

        let d = Dict::new();
        d.set("nan", f64::NAN);
        assert!(matches!(d.to_json(), Err(Error::Encode(_))));

        let d = Dict::new();
        d.set("inf", Value::Floats(vec![1.0, f64::INFINITY]));
        assert!(d.to_json().is_err());
    }

    #[test]
    fn decode_typed_sequences_and_nesting() {
        let j = r#"{
            "1": true,
            "2": "two",
            "3": 3.30003,
            "4a": ["horse", "cow"],
            "4b": [1, 2, 3],
            "4c": [1.1, 2.2, 3.3],
            "4d": [3, "something", 4.4],
            "4e": [null, null, 0.0001, null],
            "4f": [true, false, null],
            "4g": [[1], {"a": 1}],
            "4h": [null, null],
            "5": {"horse": "neighs", "cow": "moos", "dog": "woofs"},
            "6": null
        }"#;
        let d = Dict::from_json(j).unwrap();
        assert_eq!(d.len(), 13);

        let cases: Vec<(&str, Value)> = vec![
            ("1", Value::Bool(true)),
            ("2", Value::from("two")),
            ("3", Value::Float(3.30003)),
            ("4a", Value::Strings(vec!["horse".into(), "cow".into()])),
            ("4b", Value::Floats(vec![1.0, 2.0, 3.0])),
            ("4c", Value::Floats(vec![1.1, 2.2, 3.3])),
            (
                "4d",
                Value::List(vec![Value::Float(3.0), Value::from("something"), Value::Float(4.4)]),
            ),
            ("4e", Value::Floats(vec![0.0, 0.0, 0.0001, 0.0])),
            ("4f", Value::Bools(vec![true, false, false])),
            ("4h", Value::List(vec![Value::Null, Value::Null])),
            ("6", Value::Null),
        ];
        for (k, expected) in cases {
            assert_eq!(d.get(k), Some(expected), "key {}", k);
        }

        let mixed = d.get("4g").unwrap();
        let mixed = mixed.as_list().unwrap();
        assert_eq!(mixed[0], Value::Floats(vec![1.0]));
        assert_eq!(mixed[1].as_dict().unwrap().get("a"), Some(Value::Float(1.0)));

        let nested = d.get("5").unwrap();
        let nested = nested.as_dict().unwrap();
        assert_eq!(nested.len(), 3);
        assert_eq!(nested.get("horse"), Some(Value::from("neighs")));
        assert_eq!(nested.get("cow"), Some(Value::from("moos")));
        assert_eq!(nested.get("dog"), Some(Value::from("woofs")));
    }

    #[test]
    fn decode_errors_leave_dict_untouched() {
        let d = dict![vec![1, 2]];
        let v = d.version();
        assert!(matches!(d.update_json(""), Err(Error::Decode(_))));
        assert!(matches!(d.update_json(r#"{"a": 1,"#), Err(Error::Decode(_))));
        assert!(matches!(d.update_json("[1, 2]"), Err(Error::NotAnObject("array"))));
        assert_eq!(d.version(), v);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn decode_null_is_empty() {
        let d = Dict::new();
        assert!(!d.update_json("null").unwrap());
        assert!(d.is_empty());
    }

    #[test]
    fn update_json_overwrites() {
        let d = Dict::new();
        d.set("a", 1.0);
        assert!(!d.update_json(r#"{"a": 1}"#).unwrap());
        assert!(d.update_json(r#"{"a": 2}"#).unwrap());
        assert_eq!(d.get("a"), Some(Value::Float(2.0)));
    }

    #[test]
    fn serde_deserialize_impl() {
        let d: Dict = serde_json::from_str(r#"{"k": ["a", "b"]}"#).unwrap();
        assert_eq!(d.get("k"), Some(Value::Strings(vec!["a".into(), "b".into()])));
        assert!(serde_json::from_str::<Dict>("3").is_err());
    }

    #[test]
    fn round_trip_through_text() {
        let d = Dict::new();
        d.set("name", "x").set("tags", Value::Strings(vec!["a".into()]));
        d.set("inner", dict![("ok", true)]);
        let back = Dict::from_json(&d.to_json().unwrap()).unwrap();
        assert_eq!(back.get("name"), Some(Value::from("x")));
        assert_eq!(back.get("tags"), d.get("tags"));
        let inner = back.get("inner").unwrap();
        assert_eq!(inner.as_dict().unwrap().get("ok"), Some(Value::Bool(true)));
    }
}
