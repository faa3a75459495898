//! Partial update type
//!
//! A sparse overlay. A key that is absent is left alone, a key mapped to
//! JSON `null` clears the field, anything else replaces it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::{json_type_name, FieldViolation, FlatRecord};

/// One change to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Replace the field with this value
    Set(Value),
    /// Remove the field
    Clear,
}

/// Sparse set of field changes for one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialUpdate {
    changes: BTreeMap<String, Patch>,
}

impl PartialUpdate {
    /// Creates an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a replacement.
    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.changes.insert(field.into(), Patch::Set(value));
        self
    }

    /// Adds a removal.
    pub fn clear(mut self, field: impl Into<String>) -> Self {
        self.changes.insert(field.into(), Patch::Clear);
        self
    }

    /// Reads an update from a JSON object; `null` values become [`Patch::Clear`].
    pub fn from_map(map: &FlatRecord) -> Self {
        let changes = map
            .iter()
            .map(|(k, v)| {
                let patch = match v {
                    Value::Null => Patch::Clear,
                    other => Patch::Set(other.clone()),
                };
                (k.clone(), patch)
            })
            .collect();
        Self { changes }
    }

    /// Reads an update from any JSON value, which must be an object.
    pub fn from_json(value: &Value) -> Result<Self, FieldViolation> {
        match value.as_object() {
            Some(map) => Ok(Self::from_map(map)),
            None => Err(FieldViolation::type_mismatch(
                "changes",
                "object",
                json_type_name(value),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn get(&self, field: &str) -> Option<&Patch> {
        self.changes.get(field)
    }

    /// Changed field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Patch)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_means_clear_absent_means_untouched() {
        let update = PartialUpdate::from_json(&json!({"email": null, "weight": 90})).unwrap();
        assert_eq!(update.get("email"), Some(&Patch::Clear));
        assert_eq!(update.get("weight"), Some(&Patch::Set(json!(90))));
        assert_eq!(update.get("height"), None);
        assert_eq!(update.len(), 2);
    }

    #[test]
    fn test_non_object_rejected() {
        let err = PartialUpdate::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.field, "changes");
        assert_eq!(err.constraint, "type");
    }

    #[test]
    fn test_builder() {
        let update = PartialUpdate::new().set("age", json!(40)).clear("married");
        assert_eq!(update.fields().collect::<Vec<_>>(), vec!["age", "married"]);
        assert!(!update.is_empty());
        assert!(PartialUpdate::new().is_empty());
    }
}
