//! @module "Annotation Bag"
//! @summary "Immutable key to value(s) result of parsing one block"
//! @domain core
//! @layer types

use indexmap::IndexMap;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// Separator between a namespace and the rest of a key (`ns.key`)
pub const NAMESPACE_SEPARATOR: char = '.';

/// @summary "Value(s) stored under one key"
///
/// A key seen once holds a bare value; a key seen several times holds every
/// value in encounter order. Serializes as the bare value or as an array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Single(Value),
    Multiple(Vec<Value>),
}

impl Entry {
    /// Every value under the key, in encounter order
    pub fn values(&self) -> &[Value] {
        match self {
            Entry::Single(value) => std::slice::from_ref(value),
            Entry::Multiple(values) => values,
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn is_multiple(&self) -> bool {
        matches!(self, Entry::Multiple(_))
    }

    /// The bare value of a single-occurrence key
    pub fn as_single(&self) -> Option<&Value> {
        match self {
            Entry::Single(value) => Some(value),
            Entry::Multiple(_) => None,
        }
    }

    pub fn first(&self) -> Option<&Value> {
        self.values().first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.values().last()
    }

    /// The entry as one JSON value (arrays for repeated keys)
    pub fn to_value(&self) -> Value {
        match self {
            Entry::Single(value) => value.clone(),
            Entry::Multiple(values) => Value::Array(values.clone()),
        }
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Entry::Single(value) => vec![value],
            Entry::Multiple(values) => values,
        }
    }

    /// Collapse a one-element sequence into a bare value
    fn condense(mut values: Vec<Value>) -> Self {
        debug_assert!(!values.is_empty(), "keys are created with their first value");
        if values.len() == 1 {
            if let Some(value) = values.pop() {
                return Entry::Single(value);
            }
        }
        Entry::Multiple(values)
    }
}

/// @summary "Parsed annotations of one comment block"
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnnotationBag {
    entries: IndexMap<String, Entry>,
}

impl AnnotationBag {
    /// Build the bag from accumulated key → values sequences
    pub(crate) fn condense(accumulator: IndexMap<String, Vec<Value>>) -> Self {
        let entries = accumulator
            .into_iter()
            .map(|(key, values)| (key, Entry::condense(values)))
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in first-encounter order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Entry> {
        self.entries.iter()
    }

    /// Values under `key` as a sequence; empty when the key is absent
    pub fn get_as_array(&self, key: &str) -> Vec<Value> {
        self.get(key)
            .map(|entry| entry.values().to_vec())
            .unwrap_or_default()
    }

    /// Deserialize the entry under `key` into `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|entry| serde_json::from_value(entry.to_value()))
            .transpose()
            .map_err(Into::into)
    }

    /// Entries whose key matches `pattern` (searched anywhere in the key)
    pub fn grep(&self, pattern: &Regex) -> AnnotationBag {
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| pattern.is_match(key))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();
        Self { entries }
    }

    /// Entries under `namespace`, with the `namespace.` prefix removed
    pub fn use_namespace(&self, namespace: &str) -> AnnotationBag {
        let prefix = format!(
            "{}{}",
            namespace.trim_end_matches(NAMESPACE_SEPARATOR),
            NAMESPACE_SEPARATOR
        );
        let entries = self
            .entries
            .iter()
            .filter_map(|(key, entry)| {
                key.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), entry.clone()))
            })
            .collect();
        Self { entries }
    }

    /// Merge with `other`; keys already present here win
    pub fn union(&self, other: &AnnotationBag) -> AnnotationBag {
        let mut entries = self.entries.clone();
        for (key, entry) in &other.entries {
            entries.entry(key.clone()).or_insert_with(|| entry.clone());
        }
        Self { entries }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn into_inner(self) -> IndexMap<String, Entry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a AnnotationBag {
    type Item = (&'a String, &'a Entry);
    type IntoIter = indexmap::map::Iter<'a, String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for AnnotationBag {
    type Item = (String, Entry);
    type IntoIter = indexmap::map::IntoIter<String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
