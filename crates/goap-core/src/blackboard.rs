use core::fmt;
use std::collections::BTreeMap;
use std::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::BlackboardError;

/// Opaque handle to an entity owned by the host (an enemy, a pickup, a cover point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityRef(pub u64);

/// A single blackboard entry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Entity(EntityRef),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Str(_) => ValueKind::Str,
            Value::Entity(_) => ValueKind::Entity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Str,
    Entity,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Str => "string",
            ValueKind::Entity => "entity",
        };
        f.write_str(name)
    }
}

/// Rust types that can be stored in a [`Blackboard`].
pub trait BbValue: Sized {
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

impl BbValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl BbValue for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl BbValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl BbValue for String {
    const KIND: ValueKind = ValueKind::Str;

    fn into_value(self) -> Value {
        Value::Str(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl BbValue for EntityRef {
    const KIND: ValueKind = ValueKind::Entity;

    fn into_value(self) -> Value {
        Value::Entity(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Entity(v) => Some(*v),
            _ => None,
        }
    }
}

/// Typed blackboard key.
///
/// The name is the storage key; the type parameter pins down which [`Value`] variant readers
/// expect, so a mismatch surfaces as [`BlackboardError::TypeMismatch`] instead of a silent
/// coercion.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: BbValue> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: BbValue> Copy for BbKey<T> {}

impl<T: BbValue> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: BbValue> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

/// Per-agent knowledge store.
///
/// Keys are kept ordered so iteration (and anything derived from it) is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Blackboard {
    values: BTreeMap<String, Value>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn set<T: BbValue>(&mut self, key: BbKey<T>, value: T) {
        self.values.insert(key.name.to_owned(), value.into_value());
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get<T: BbValue>(&self, key: BbKey<T>) -> Result<T, BlackboardError> {
        let value = self
            .values
            .get(key.name)
            .ok_or_else(|| BlackboardError::MissingKey {
                key: key.name.to_owned(),
            })?;
        Self::decode(key, value)
    }

    /// Like [`Blackboard::get`], but a missing key yields `default`. A present key of the wrong
    /// type is still an error.
    pub fn get_or<T: BbValue>(&self, key: BbKey<T>, default: T) -> Result<T, BlackboardError> {
        match self.values.get(key.name) {
            Some(value) => Self::decode(key, value),
            None => Ok(default),
        }
    }

    /// Read-modify-write of a typed entry. The key must already exist.
    pub fn update<T: BbValue>(
        &mut self,
        key: BbKey<T>,
        f: impl FnOnce(T) -> T,
    ) -> Result<(), BlackboardError> {
        let current = self.get(key)?;
        self.set(key, f(current));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn decode<T: BbValue>(key: BbKey<T>, value: &Value) -> Result<T, BlackboardError> {
        T::from_value(value).ok_or_else(|| BlackboardError::TypeMismatch {
            key: key.name.to_owned(),
            expected: T::KIND,
            found: value.kind(),
        })
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Blackboard {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut bb = Blackboard::new();
        bb.extend(iter);
        bb
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Blackboard {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.values.insert(k.into(), v);
        }
    }
}
