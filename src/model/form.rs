//! Settings form values and the load-time snapshot used for dirty checking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Checkbox state
    Checkbox(bool),
    /// Any other input, compared as text
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// Field values captured when the page loaded. Never changes afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    fields: BTreeMap<String, FieldValue>,
}

impl FormSnapshot {
    /// Capture a snapshot from `(name, value)` pairs. Later duplicates win.
    pub fn capture<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldValue)>,
        K: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether `value` differs from the snapshot.
    ///
    /// Checkboxes compare by boolean identity; a checkbox missing from the
    /// snapshot counts as unchecked. Other fields compare as strings, and a
    /// field missing from the snapshot always counts as changed.
    pub fn differs(&self, name: &str, value: &FieldValue) -> bool {
        match (self.fields.get(name), value) {
            (Some(FieldValue::Checkbox(saved)), FieldValue::Checkbox(current)) => saved != current,
            (None, FieldValue::Checkbox(current)) => *current,
            (Some(FieldValue::Text(saved)), FieldValue::Text(current)) => saved != current,
            (Some(_), _) | (None, FieldValue::Text(_)) => true,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
