//! Type identity and type-relationship resolution.
//!
//! Rust has no runtime class hierarchy, so ancestor chains and model aliases
//! are supplied through the [`TypeRelations`] trait. [`TypeHierarchy`] is an
//! in-memory implementation that linearizes declared parents with C3.

use crate::errors::FieldgateError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Opaque identity of an object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Creates a key from a type name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Creates a key naming the Rust type `T`.
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Returns the type name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&TypeKey> for TypeKey {
    fn from(key: &TypeKey) -> Self {
        key.clone()
    }
}

/// Instances that know which object type they belong to.
///
/// All types of one hierarchy share a single instance representation
/// (usually a trait object), so validators registered on an ancestor
/// receive the same reference as those registered on the concrete type.
pub trait Typed {
    /// Returns the object type of this instance.
    fn type_key(&self) -> TypeKey;
}

/// Resolves the relationships used to inherit validators.
#[cfg_attr(test, mockall::automock)]
pub trait TypeRelations: Send + Sync {
    /// Returns the linearized ancestor chain, most-derived first and starting
    /// with `ty` itself, or `None` when `ty` is not a class-like type.
    fn ancestors_of(&self, ty: &TypeKey) -> Option<Vec<TypeKey>>;

    /// Returns the type `ty` stands in for, if any.
    fn model_alias_of(&self, ty: &TypeKey) -> Option<TypeKey>;
}

/// In-memory type hierarchy with C3 linearization.
#[derive(Debug, Default)]
pub struct TypeHierarchy {
    linearized: RwLock<HashMap<TypeKey, Vec<TypeKey>>>,
    aliases: RwLock<HashMap<TypeKey, TypeKey>>,
}

impl TypeHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `ty` with its direct parents, in declaration order.
    ///
    /// Parents that were never declared are treated as roots. Returns the
    /// computed linearization.
    ///
    /// # Errors
    ///
    /// Fails when `ty` is already declared, lists itself as a parent, or when
    /// no consistent linearization exists.
    pub fn declare<P>(
        &self,
        ty: impl Into<TypeKey>,
        parents: impl IntoIterator<Item = P>,
    ) -> Result<Vec<TypeKey>, FieldgateError>
    where
        P: Into<TypeKey>,
    {
        let ty = ty.into();
        let parents: Vec<TypeKey> = parents.into_iter().map(Into::into).collect();

        if parents.contains(&ty) {
            return Err(FieldgateError::Configuration(format!(
                "Type '{ty}' cannot inherit from itself"
            )));
        }

        let mut linearized = self.linearized.write();
        if linearized.contains_key(&ty) {
            return Err(FieldgateError::Configuration(format!(
                "Type '{ty}' is already declared"
            )));
        }

        let mut sequences: Vec<Vec<TypeKey>> = parents
            .iter()
            .map(|parent| {
                linearized
                    .get(parent)
                    .cloned()
                    .unwrap_or_else(|| vec![parent.clone()])
            })
            .collect();
        sequences.push(parents);

        let tail = c3_merge(sequences).ok_or_else(|| {
            FieldgateError::Configuration(format!(
                "Cannot create a consistent method resolution order for '{ty}'"
            ))
        })?;

        let mut chain = Vec::with_capacity(tail.len() + 1);
        chain.push(ty.clone());
        chain.extend(tail);
        linearized.insert(ty, chain.clone());
        Ok(chain)
    }

    /// Records that `ty` stands in for `origin`.
    ///
    /// # Errors
    ///
    /// Fails when a type is declared as an alias of itself.
    pub fn alias(
        &self,
        ty: impl Into<TypeKey>,
        origin: impl Into<TypeKey>,
    ) -> Result<(), FieldgateError> {
        let ty = ty.into();
        let origin = origin.into();
        if ty == origin {
            return Err(FieldgateError::Configuration(format!(
                "Type '{ty}' cannot be a model alias of itself"
            )));
        }
        self.aliases.write().insert(ty, origin);
        Ok(())
    }

    /// Returns true if `ty` was declared.
    #[must_use]
    pub fn contains(&self, ty: &TypeKey) -> bool {
        self.linearized.read().contains_key(ty)
    }
}

impl TypeRelations for TypeHierarchy {
    fn ancestors_of(&self, ty: &TypeKey) -> Option<Vec<TypeKey>> {
        self.linearized.read().get(ty).cloned()
    }

    fn model_alias_of(&self, ty: &TypeKey) -> Option<TypeKey> {
        self.aliases.read().get(ty).cloned()
    }
}

/// Merges linearizations, picking at each step the first head that appears
/// in no other sequence's tail.
fn c3_merge(mut sequences: Vec<Vec<TypeKey>>) -> Option<Vec<TypeKey>> {
    let mut result = Vec::new();
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }

        let candidate = sequences
            .iter()
            .map(|seq| &seq[0])
            .find(|head| !sequences.iter().any(|seq| seq[1..].contains(*head)))?
            .clone();

        for seq in &mut sequences {
            if seq[0] == candidate {
                seq.remove(0);
            }
        }
        result.push(candidate);
    }
}
