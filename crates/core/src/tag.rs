//! Key-value tag trees used as the persistence medium.
//!
//! A [`TagCompound`] is a string-keyed tree of integers, text, and nested
//! compounds. It is the unit hosts hand to the inventory on save/load;
//! iteration order is stable (keys are kept sorted) so serialized output
//! is deterministic across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error produced when decoding a value out of a [`TagCompound`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// A required field was not present.
    #[error("missing tag field `{0}`")]
    MissingField(String),
    /// A field was present but held an unusable value.
    #[error("invalid tag field `{field}`: {reason}")]
    InvalidField {
        /// Key of the offending field.
        field: String,
        /// Human-readable description of what was wrong.
        reason: String,
    },
}

impl TagError {
    /// Shorthand for [`TagError::MissingField`].
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    /// Shorthand for [`TagError::InvalidField`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// One value in a tag tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagValue {
    /// Integer value.
    Int(i64),
    /// Text value.
    Text(String),
    /// Nested compound.
    Compound(TagCompound),
}

/// String-keyed tree of tag values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCompound {
    entries: BTreeMap<String, TagValue>,
}

impl TagCompound {
    /// Create an empty compound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the compound holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether a key is present, regardless of its value type.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Store an integer, replacing any previous value under `key`.
    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.entries.insert(key.into(), TagValue::Int(value));
    }

    /// Read an integer. `None` if absent or not an integer.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.entries.get(key) {
            Some(TagValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Store text, replacing any previous value under `key`.
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), TagValue::Text(value.into()));
    }

    /// Read text. `None` if absent or not text.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(TagValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Store a nested compound, replacing any previous value under `key`.
    pub fn set_compound(&mut self, key: impl Into<String>, value: TagCompound) {
        self.entries.insert(key.into(), TagValue::Compound(value));
    }

    /// Read a nested compound. `None` if absent or not a compound.
    pub fn compound(&self, key: &str) -> Option<&TagCompound> {
        match self.entries.get(key) {
            Some(TagValue::Compound(value)) => Some(value),
            _ => None,
        }
    }

    /// Remove and return the value under `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<TagValue> {
        self.entries.remove(key)
    }
}
