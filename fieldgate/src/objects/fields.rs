//! Field metadata for object types.

use super::TypeKey;
use crate::errors::FieldgateError;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One declared field of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectField {
    /// Identifier used in code.
    pub name: String,
    /// Name used in external representations.
    pub alias: String,
    /// Name validators may use to target the field.
    pub declared_name: String,
    /// Init-only pseudo field, visible to deserialization only.
    #[serde(default)]
    pub init_only: bool,
}

impl ObjectField {
    /// Creates a field whose alias and declared name equal its identifier.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            declared_name: name.clone(),
            name,
            init_only: false,
        }
    }

    /// Sets the public alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Sets the declared name.
    #[must_use]
    pub fn with_declared_name(mut self, declared_name: impl Into<String>) -> Self {
        self.declared_name = declared_name.into();
        self
    }

    /// Marks the field as init-only.
    #[must_use]
    pub fn init_only(mut self) -> Self {
        self.init_only = true;
        self
    }
}

/// Ordered fields of one object type, keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet {
    fields: Vec<ObjectField>,
}

impl FieldSet {
    /// Creates a field set, keeping declaration order.
    ///
    /// # Errors
    ///
    /// Fails if two fields share an identifier.
    pub fn new(fields: impl IntoIterator<Item = ObjectField>) -> Result<Self, FieldgateError> {
        let mut set = Self::default();
        for field in fields {
            if set.get(&field.name).is_some() {
                return Err(FieldgateError::Configuration(format!(
                    "Duplicate field '{}'",
                    field.name
                )));
            }
            set.fields.push(field);
        }
        Ok(set)
    }

    /// Looks up a field by identifier.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ObjectField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field by declared name.
    #[must_use]
    pub fn by_declared_name(&self, declared_name: &str) -> Option<&ObjectField> {
        self.fields.iter().find(|f| f.declared_name == declared_name)
    }

    /// Resolves a field reference, by identifier first and declared name second.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&ObjectField> {
        self.get(name).or_else(|| self.by_declared_name(name))
    }

    /// Returns the fields visible in the given direction.
    #[must_use]
    pub fn for_direction(&self, serialization: bool) -> Self {
        if !serialization {
            return self.clone();
        }
        Self {
            fields: self.fields.iter().filter(|f| !f.init_only).cloned().collect(),
        }
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectField> {
        self.fields.iter()
    }

    /// Returns the field identifiers in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Returns the public aliases in declaration order.
    #[must_use]
    pub fn aliases(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.alias.as_str()).collect()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A field named by identifier or declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRef(String);

impl FieldRef {
    /// Creates a field reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the referenced name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&ObjectField> for FieldRef {
    fn from(field: &ObjectField) -> Self {
        Self(field.name.clone())
    }
}

/// Source of field metadata for object types.
#[cfg_attr(test, mockall::automock)]
pub trait FieldResolver: Send + Sync {
    /// Returns the ordered fields of `ty`.
    ///
    /// Init-only fields are omitted when `serialization` is true.
    ///
    /// # Errors
    ///
    /// Returns [`FieldgateError::UnknownType`] if `ty` is not an object type.
    fn fields_of(&self, ty: &TypeKey, serialization: bool) -> Result<FieldSet, FieldgateError>;
}

/// In-memory field metadata, populated by type declarations.
#[derive(Debug, Default)]
pub struct FieldCatalog {
    types: RwLock<HashMap<TypeKey, FieldSet>>,
}

impl FieldCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the fields of `ty`, replacing any previous declaration.
    ///
    /// # Errors
    ///
    /// Fails if two fields share an identifier.
    pub fn define(
        &self,
        ty: impl Into<TypeKey>,
        fields: impl IntoIterator<Item = ObjectField>,
    ) -> Result<(), FieldgateError> {
        let set = FieldSet::new(fields)?;
        self.types.write().insert(ty.into(), set);
        Ok(())
    }

    /// Returns true if `ty` has declared fields.
    #[must_use]
    pub fn contains(&self, ty: &TypeKey) -> bool {
        self.types.read().contains_key(ty)
    }
}

impl FieldResolver for FieldCatalog {
    fn fields_of(&self, ty: &TypeKey, serialization: bool) -> Result<FieldSet, FieldgateError> {
        self.types
            .read()
            .get(ty)
            .map(|set| set.for_direction(serialization))
            .ok_or_else(|| FieldgateError::UnknownType(ty.clone()))
    }
}

/// Memoizes another resolver per `(type, serialization)` pair.
///
/// Failures are not cached.
pub struct CachedFieldResolver<R> {
    inner: R,
    cache: DashMap<(TypeKey, bool), FieldSet>,
}

impl<R: FieldResolver> CachedFieldResolver<R> {
    /// Wraps a resolver.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Returns the number of cached entries.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl<R: FieldResolver> FieldResolver for CachedFieldResolver<R> {
    fn fields_of(&self, ty: &TypeKey, serialization: bool) -> Result<FieldSet, FieldgateError> {
        let key = (ty.clone(), serialization);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }
        let fields = self.inner.fields_of(ty, serialization)?;
        self.cache.insert(key, fields.clone());
        Ok(fields)
    }
}

impl<R> fmt::Debug for CachedFieldResolver<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFieldResolver")
            .field("cached_len", &self.cache.len())
            .finish()
    }
}
