//! Chunks - typed attribute-value records
//!
//! Chunks are the payload of every buffer and the unit stored in declarative
//! memory. Slot values written by production rules may reference variables
//! (`=name`) that are resolved against the bindings of the firing rule.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::{PacemakerError, PacemakerResult};

/// Prefix marking a variable reference in a slot value
pub const VARIABLE_PREFIX: char = '=';

/// Value held by a chunk slot
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlotValue {
    /// Literal value
    Value(String),
    /// Reference to a rule variable, without the `=` prefix
    Variable(String),
    /// Slot present but unused
    Empty,
}

impl SlotValue {
    /// Literal value
    pub fn value(v: impl ToString) -> Self {
        SlotValue::Value(v.to_string())
    }

    /// Variable reference
    pub fn variable(name: impl Into<String>) -> Self {
        SlotValue::Variable(name.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SlotValue::Empty)
    }

    /// Resolve against bindings; literals resolve to themselves
    pub fn resolve(&self, bindings: &Bindings) -> PacemakerResult<Option<String>> {
        match self {
            SlotValue::Value(v) => Ok(Some(v.clone())),
            SlotValue::Variable(name) => bindings
                .get(name)
                .map(|v| Some(v.to_string()))
                .ok_or_else(|| PacemakerError::UnboundVariable(name.clone())),
            SlotValue::Empty => Ok(None),
        }
    }
}

/// Parses the production-rule notation: `=x` is a variable, anything else a literal
impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        match s.strip_prefix(VARIABLE_PREFIX) {
            Some(name) => SlotValue::Variable(name.to_string()),
            None => SlotValue::Value(s.to_string()),
        }
    }
}

impl From<u64> for SlotValue {
    fn from(n: u64) -> Self {
        SlotValue::Value(n.to_string())
    }
}

impl<T: Into<SlotValue>> From<Option<T>> for SlotValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SlotValue::Empty, Into::into)
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotValue::Value(v) => write!(f, "{}", v),
            SlotValue::Variable(name) => write!(f, "{}{}", VARIABLE_PREFIX, name),
            SlotValue::Empty => write!(f, "None"),
        }
    }
}

/// Variable bindings of a firing production rule
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings(HashMap<String, String>);

impl Bindings {
    pub fn new() -> Self {
        Bindings::default()
    }

    /// Bind a variable, returning the bindings for chaining
    pub fn bind(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Typed attribute-value record
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Chunk {
    type_name: String,
    slots: BTreeMap<String, SlotValue>,
}

impl Chunk {
    /// Create an empty chunk of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Chunk {
            type_name: type_name.into(),
            slots: BTreeMap::new(),
        }
    }

    /// Builder-style slot assignment
    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<SlotValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a slot, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SlotValue>) -> Option<SlotValue> {
        self.slots.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue> {
        self.slots.get(name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// All slots, including unused ones
    pub fn slots(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Slots that carry a value or a variable
    pub fn remove_unused(&self) -> impl Iterator<Item = (&str, &SlotValue)> {
        self.slots().filter(|(_, v)| !v.is_empty())
    }

    /// Resolve every used slot against the bindings
    pub fn resolve(&self, bindings: &Bindings) -> PacemakerResult<BTreeMap<String, String>> {
        let mut resolved = BTreeMap::new();
        for (name, value) in self.remove_unused() {
            if let Some(v) = value.resolve(bindings)? {
                resolved.insert(name.to_string(), v);
            }
        }
        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name)?;
        for (i, (name, value)) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}= {}", name, value)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_slot_value_parse() {
        assert_eq!(SlotValue::from("=x"), SlotValue::Variable("x".into()));
        assert_eq!(SlotValue::from("0"), SlotValue::Value("0".into()));
        assert_eq!(SlotValue::from(None::<&str>), SlotValue::Empty);
    }

    #[test]
    fn test_resolve_bound_variable() {
        let chunk = Chunk::new("_time").with_slot("ticks", "=start");
        let bindings = Bindings::new().bind("start", 0);

        let resolved = chunk.resolve(&bindings).unwrap();
        assert_eq!(resolved.get("ticks").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_resolve_unbound_variable() {
        let chunk = Chunk::new("_time").with_slot("ticks", "=start");

        let err = chunk.resolve(&Bindings::new()).unwrap_err();
        assert_eq!(err, PacemakerError::UnboundVariable("start".into()));
    }

    #[test]
    fn test_remove_unused() {
        let chunk = Chunk::new("_time")
            .with_slot("ticks", 0u64)
            .with_slot("label", None::<&str>);

        assert_eq!(chunk.len(), 2);
        let used: Vec<_> = chunk.remove_unused().map(|(k, _)| k).collect();
        assert_eq!(used, vec!["ticks"]);
    }

    #[test]
    fn test_display() {
        let chunk = Chunk::new("_time").with_slot("ticks", 3u64);
        assert_eq!(chunk.to_string(), "_time(ticks= 3)");
    }

    proptest! {
        #[test]
        fn prop_resolve_keeps_only_used_slots(used in 0usize..6, unused in 0usize..6) {
            let mut chunk = Chunk::new("test");
            for i in 0..used {
                chunk.set(format!("used{}", i), i as u64);
            }
            for i in 0..unused {
                chunk.set(format!("unused{}", i), SlotValue::Empty);
            }

            let resolved = chunk.resolve(&Bindings::new()).unwrap();
            prop_assert_eq!(resolved.len(), used);
            prop_assert_eq!(chunk.len(), used + unused);
        }
    }
}
