//! The context threaded through a run, and the pieces cut from it.

use crate::error::ContextError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Append-only key/value bag owned by one run.
///
/// Writes never overwrite: [`Context::set`] and [`Context::merge`] report a
/// [`ContextError::KeyCollision`] instead. The only way to change an
/// existing key is the explicit [`Context::replace`].
///
/// Keys are ordered, so snapshots and their serialized form are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, Value>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context pre-populated with seed values.
    pub fn seeded(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    /// Read a key.
    pub fn get(&self, key: &str) -> Result<&Value, ContextError> {
        self.values.get(key).ok_or_else(|| ContextError::MissingKey {
            key: key.to_owned(),
        })
    }

    /// Write a new key. Fails if the key is already present.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Result<(), ContextError> {
        let key = key.into();
        if self.values.contains_key(&key) {
            return Err(ContextError::KeyCollision { key });
        }
        self.values.insert(key, value);
        Ok(())
    }

    /// Overwrite an existing key, returning the previous value.
    /// Fails if the key is absent: replace is not a way to add keys.
    pub fn replace(&mut self, key: &str, value: Value) -> Result<Value, ContextError> {
        match self.values.get_mut(key) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(ContextError::MissingKey {
                key: key.to_owned(),
            }),
        }
    }

    /// Apply a step's output fragment.
    ///
    /// All-or-nothing: if any key collides, nothing is written and the
    /// first colliding key (in key order) is reported.
    pub fn merge(&mut self, fragment: Fragment) -> Result<(), ContextError> {
        if let Some(key) = fragment.keys().find(|k| self.values.contains_key(*k)) {
            return Err(ContextError::KeyCollision { key: key.clone() });
        }
        self.values.extend(fragment.into_inner());
        Ok(())
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Present keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Immutable copy of the whole context.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            values: self.values.clone(),
        }
    }

    /// Immutable copy restricted to `keys`. Fails on the first absent key.
    pub fn select<S: AsRef<str>>(&self, keys: &[S]) -> Result<ContextSnapshot, ContextError> {
        let mut values = BTreeMap::new();
        for key in keys {
            let key = key.as_ref();
            let value = self.get(key)?;
            values.insert(key.to_owned(), value.clone());
        }
        Ok(ContextSnapshot { values })
    }

    /// Consume the context and return its entries.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

/// Immutable copy of (part of) a context.
///
/// Handed to steps as their input and stored in trace entries. Nothing
/// that happens to the live context afterwards changes a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextSnapshot {
    values: BTreeMap<String, Value>,
}

impl ContextSnapshot {
    /// Read a key from the snapshot.
    pub fn get(&self, key: &str) -> Result<&Value, ContextError> {
        self.values.get(key).ok_or_else(|| ContextError::MissingKey {
            key: key.to_owned(),
        })
    }

    /// Whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The snapshot as a map value.
    pub fn to_value(&self) -> Value {
        Value::Map(self.values.clone())
    }
}

impl From<BTreeMap<String, Value>> for ContextSnapshot {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

/// The outputs one step hands back to the executor.
///
/// ```
/// use flow0::{Fragment, Value};
///
/// let fragment = Fragment::new().with("summary", Value::text("up 14%"));
/// assert_eq!(fragment.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    values: BTreeMap<String, Value>,
}

impl Fragment {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert an output, returning any value previously stored under it.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Read an output.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Output keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of outputs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume the fragment and return its entries.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Fragment {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Fragment {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
