#![cfg(test)]

// Property tests for Dict kept inside the crate so they can check the
// order sequence and value index through `Dict::structure`.

use crate::dict::Dict;
use crate::value::Value;
use proptest::prelude::*;

// A key drawn from a small numeric pool, spelled either as an integer or as
// its decimal text. Both spellings must land on the same slot.
#[derive(Clone, Debug)]
enum KeyI {
    Int(u8),
    Text(u8),
}

impl KeyI {
    fn value(&self) -> Value {
        match self {
            KeyI::Int(n) => Value::Int(*n as i64),
            KeyI::Text(n) => Value::String(n.to_string()),
        }
    }

    fn name(&self) -> String {
        match self {
            KeyI::Int(n) | KeyI::Text(n) => n.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
enum OpI {
    Set(KeyI, i8),
    Remove(KeyI),
    Pop(KeyI),
    PopItem,
    Clear,
    Get(KeyI),
    Append(Vec<i8>),
}

fn arb_key() -> impl Strategy<Value = KeyI> {
    prop_oneof![
        (0u8..12).prop_map(KeyI::Int),
        (0u8..12).prop_map(KeyI::Text),
    ]
}

fn arb_ops() -> impl Strategy<Value = Vec<OpI>> {
    let op = prop_oneof![
        4 => (arb_key(), any::<i8>()).prop_map(|(k, v)| OpI::Set(k, v)),
        2 => arb_key().prop_map(OpI::Remove),
        1 => arb_key().prop_map(OpI::Pop),
        1 => Just(OpI::PopItem),
        1 => Just(OpI::Clear),
        2 => arb_key().prop_map(OpI::Get),
        1 => proptest::collection::vec(any::<i8>(), 0..4).prop_map(OpI::Append),
    ];
    proptest::collection::vec(op, 1..80)
}

// Ordered reference model with the same versioning rules.
#[derive(Default)]
struct Model {
    entries: Vec<(String, i8)>,
    version: u64,
}

impl Model {
    fn set(&mut self, name: String, v: i8) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => {
                if slot.1 != v {
                    self.version += 1;
                }
                slot.1 = v;
            }
            None => {
                self.entries.push((name, v));
                self.version += 1;
            }
        }
    }

    fn remove(&mut self, name: &str) -> Option<i8> {
        let idx = self.entries.iter().position(|(k, _)| k == name)?;
        self.version += 1;
        Some(self.entries.remove(idx).1)
    }
}

fn check_structure(d: &Dict) -> Result<(), TestCaseError> {
    let (order, index, sound) = d.structure();
    prop_assert_eq!(d.len(), order);
    prop_assert_eq!(order, index);
    prop_assert!(sound, "order ids must be unique and indexed");
    Ok(())
}

// Property: state-machine equivalence against an ordered Vec model.
// Invariants exercised across random operation sequences:
// - Insertion order survives replacement and compacting removal.
// - Integer and text spellings of a key address the same entry.
// - `version` follows the model exactly (equal replacement is free, clear is +1).
// - `pop_item` is LIFO; positional appends number from the current length.
// - Counters, order sequence and value index agree after every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in arb_ops()) {
        let sut = Dict::new();
        let mut model = Model::default();

        for op in ops {
            match op {
                OpI::Set(k, v) => {
                    sut.set(k.value(), v);
                    model.set(k.name(), v);
                }
                OpI::Remove(k) => {
                    let expected = model.remove(&k.name()).is_some();
                    prop_assert_eq!(sut.remove(k.value()), expected);
                }
                OpI::Pop(k) => {
                    let expected = model.remove(&k.name()).map(|v| Value::Int(v as i64));
                    prop_assert_eq!(sut.pop(k.value()), expected);
                }
                OpI::PopItem => {
                    let expected = model.entries.pop().map(|(k, v)| (k, Value::Int(v as i64)));
                    if expected.is_some() {
                        model.version += 1;
                    }
                    prop_assert_eq!(sut.pop_item(), expected);
                }
                OpI::Clear => {
                    let expected = !model.entries.is_empty();
                    if expected {
                        model.entries.clear();
                        model.version += 1;
                    }
                    prop_assert_eq!(sut.clear(), expected);
                }
                OpI::Get(k) => {
                    let expected = model
                        .entries
                        .iter()
                        .find(|(name, _)| *name == k.name())
                        .map(|(_, v)| Value::Int(*v as i64));
                    prop_assert_eq!(sut.get(k.value()), expected);
                }
                OpI::Append(vs) => {
                    let before = model.version;
                    for v in &vs {
                        let name = model.entries.len().to_string();
                        model.set(name, *v);
                    }
                    let changed = sut.update(vs.iter().map(|v| Value::Int(*v as i64)));
                    prop_assert_eq!(changed, model.version != before);
                }
            }

            check_structure(&sut)?;
            prop_assert_eq!(sut.version(), model.version);
            let names: Vec<String> = model.entries.iter().map(|(k, _)| k.clone()).collect();
            prop_assert_eq!(sut.keys().unwrap_or_default(), names);
        }
    }
}
