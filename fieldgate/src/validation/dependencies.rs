//! Dependency resolution for validators.

use super::CheckInfo;
use crate::objects::{FieldResolver, TypeKey};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Determines which fields of `owner` a check reads.
///
/// Resolution is best effort; an empty set means "unknown", in which case
/// the validator is only pruned through its keyword parameters.
#[cfg_attr(test, mockall::automock)]
pub trait DependencyResolver: Send + Sync {
    /// Returns the fields read by `check`.
    fn resolve_dependencies(&self, owner: &TypeKey, check: &CheckInfo) -> BTreeSet<String>;
}

/// Trusts the fields a validator author declared with `reads`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDependencies;

impl DependencyResolver for DeclaredDependencies {
    fn resolve_dependencies(&self, _owner: &TypeKey, check: &CheckInfo) -> BTreeSet<String> {
        check.reads.clone()
    }
}

/// Keeps only declared reads that name a field of the owner, mapping
/// declared names to identifiers.
pub struct KnownFieldDependencies {
    fields: Arc<dyn FieldResolver>,
}

impl KnownFieldDependencies {
    /// Creates a resolver checking reads against `fields`.
    #[must_use]
    pub fn new(fields: Arc<dyn FieldResolver>) -> Self {
        Self { fields }
    }
}

impl DependencyResolver for KnownFieldDependencies {
    fn resolve_dependencies(&self, owner: &TypeKey, check: &CheckInfo) -> BTreeSet<String> {
        let Ok(fields) = self.fields.fields_of(owner, false) else {
            return BTreeSet::new();
        };
        check
            .reads
            .iter()
            .filter_map(|read| fields.resolve(read).map(|f| f.name.clone()))
            .collect()
    }
}

impl std::fmt::Debug for KnownFieldDependencies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownFieldDependencies").finish_non_exhaustive()
    }
}
