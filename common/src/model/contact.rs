use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One imported contact, keyed by column header.
///
/// The set of headers is whatever the imported sheet contained, so rows are a
/// map rather than a fixed struct. Values are kept as JSON scalars: clients may
/// send `null`, empty strings or numbers, and the renderer needs to tell those
/// apart from real text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactRow(HashMap<String, Value>);

impl ContactRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(header.into(), value.into());
    }

    pub fn contains(&self, header: &str) -> bool {
        self.0.contains_key(header)
    }

    /// Returns the textual value of `header`, or `None` when the header is
    /// missing, `null` or an empty string.
    ///
    /// Non-string scalars are coerced to their JSON text (`42`, `true`).
    pub fn text(&self, header: &str) -> Option<String> {
        match self.0.get(header)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ContactRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }
}
