//! Test fixtures for validation.

use crate::objects::{TypeKey, Typed};
use std::collections::BTreeMap;

/// A record whose type is chosen at runtime.
///
/// Lets one instance representation stand for every type of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: TypeKey,
    values: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Creates an empty record of type `ty`.
    #[must_use]
    pub fn new(ty: impl Into<TypeKey>) -> Self {
        Self {
            ty: ty.into(),
            values: BTreeMap::new(),
        }
    }

    /// Sets a field value.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: serde_json::Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.values.get(field)
    }

    /// Returns a string field value.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(serde_json::Value::as_str)
    }

    /// Returns an integer field value.
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(serde_json::Value::as_i64)
    }

    /// Returns true if the field is set.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }
}

impl Typed for Record {
    fn type_key(&self) -> TypeKey {
        self.ty.clone()
    }
}
