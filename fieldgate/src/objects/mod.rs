//! Object type metadata consumed by validation.
//!
//! This module provides:
//! - Type identity and ancestor/alias relationships
//! - Field records with public aliases
//! - Explicit field and alias getters

mod fields;
pub mod getters;
mod types;

#[cfg(test)]
pub use fields::MockFieldResolver;
pub use fields::{CachedFieldResolver, FieldCatalog, FieldRef, FieldResolver, FieldSet, ObjectField};
#[cfg(test)]
pub use types::MockTypeRelations;
pub use types::{TypeHierarchy, TypeKey, TypeRelations, Typed};
