//! Registry of validators per object type.

use crate::errors::FieldgateError;
use crate::objects::{FieldCatalog, FieldResolver, TypeHierarchy, TypeKey, TypeRelations, Typed};
use crate::validation::{self, Arguments, DeclaredDependencies, DependencyResolver, Validator};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Collaborators used to build a [`ValidatorRegistry`].
pub struct RegistryBuilder<I: ?Sized + 'static> {
    relations: Arc<dyn TypeRelations>,
    fields: Arc<dyn FieldResolver>,
    dependencies: Arc<dyn DependencyResolver>,
    instance: PhantomData<fn(&I)>,
}

impl<I: ?Sized + 'static> RegistryBuilder<I> {
    /// Sets the type-relationship resolver.
    #[must_use]
    pub fn relations(mut self, relations: Arc<dyn TypeRelations>) -> Self {
        self.relations = relations;
        self
    }

    /// Sets the field metadata resolver.
    #[must_use]
    pub fn fields(mut self, fields: Arc<dyn FieldResolver>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the dependency resolver.
    #[must_use]
    pub fn dependencies(mut self, dependencies: Arc<dyn DependencyResolver>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Builds an empty registry.
    #[must_use]
    pub fn build(self) -> ValidatorRegistry<I> {
        ValidatorRegistry {
            validators: RwLock::new(HashMap::new()),
            relations: self.relations,
            fields: self.fields,
            dependencies: self.dependencies,
        }
    }
}

impl<I: ?Sized + 'static> Default for RegistryBuilder<I> {
    fn default() -> Self {
        Self {
            relations: Arc::new(TypeHierarchy::new()),
            fields: Arc::new(FieldCatalog::new()),
            dependencies: Arc::new(DeclaredDependencies),
            instance: PhantomData,
        }
    }
}

impl<I: ?Sized + 'static> fmt::Debug for RegistryBuilder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder").finish_non_exhaustive()
    }
}

/// Validators keyed by owner type, in declaration order.
pub struct ValidatorRegistry<I: ?Sized + 'static> {
    validators: RwLock<HashMap<TypeKey, Vec<Arc<Validator<I>>>>>,
    relations: Arc<dyn TypeRelations>,
    fields: Arc<dyn FieldResolver>,
    dependencies: Arc<dyn DependencyResolver>,
}

impl<I: ?Sized + 'static> ValidatorRegistry<I> {
    /// Creates a registry with default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring collaborators.
    #[must_use]
    pub fn builder() -> RegistryBuilder<I> {
        RegistryBuilder::default()
    }

    /// Returns the field metadata resolver.
    #[must_use]
    pub fn fields(&self) -> &Arc<dyn FieldResolver> {
        &self.fields
    }

    /// Returns the type-relationship resolver.
    #[must_use]
    pub fn relations(&self) -> &Arc<dyn TypeRelations> {
        &self.relations
    }

    /// Binds `validator` to `owner` and appends it to the owner's list.
    ///
    /// # Errors
    ///
    /// Returns [`FieldgateError::AlreadyRegistered`] if the validator is
    /// already bound.
    pub fn register(
        &self,
        validator: impl Into<Arc<Validator<I>>>,
        owner: impl Into<TypeKey>,
    ) -> Result<Arc<Validator<I>>, FieldgateError> {
        let validator = validator.into();
        let owner = owner.into();

        if let Some(existing) = validator.owner() {
            return Err(FieldgateError::AlreadyRegistered {
                validator: validator.name().to_string(),
                owner: existing.clone(),
            });
        }

        let mut dependencies = self.normalize_fields(
            &owner,
            self.dependencies
                .resolve_dependencies(&owner, validator.check_info()),
        );
        dependencies.extend(validator.params().iter().cloned());

        debug!(
            owner = %owner,
            validator = validator.name(),
            dependencies = ?dependencies,
            "Registering validator"
        );
        validator.bind(owner.clone(), dependencies, Arc::clone(&self.fields))?;

        self.validators
            .write()
            .entry(owner)
            .or_default()
            .push(Arc::clone(&validator));
        Ok(validator)
    }

    /// Maps declared names to field identifiers, the way discarded fields
    /// are resolved. Unknown names and unknown types are kept as given.
    fn normalize_fields(&self, owner: &TypeKey, names: BTreeSet<String>) -> BTreeSet<String> {
        let Ok(fields) = self.fields.fields_of(owner, false) else {
            return names;
        };
        names
            .into_iter()
            .map(|name| fields.resolve(&name).map_or(name, |f| f.name.clone()))
            .collect()
    }

    /// Registers a standalone validator, taking its owner from the explicit
    /// option or from the declared type of its instance parameter.
    ///
    /// # Errors
    ///
    /// Returns [`FieldgateError::Configuration`] when no owner can be found.
    pub fn declare(&self, validator: Validator<I>) -> Result<Arc<Validator<I>>, FieldgateError> {
        let owner = validator
            .declared_owner()
            .or_else(|| validator.signature().receiver().and_then(|p| p.annotation.as_ref()))
            .cloned()
            .ok_or_else(|| {
                FieldgateError::Configuration(format!(
                    "Validator '{}' first parameter must be typed",
                    validator.name()
                ))
            })?;
        self.register(validator, owner)
    }

    /// Returns the validators registered directly on `ty`.
    #[must_use]
    pub fn own_validators(&self, ty: &TypeKey) -> Vec<Arc<Validator<I>>> {
        self.validators.read().get(ty).cloned().unwrap_or_default()
    }

    /// Returns `ty`'s validators followed by inherited ones: ancestors in
    /// resolution order, then model-alias targets.
    #[must_use]
    pub fn get_validators(&self, ty: &TypeKey) -> Vec<Arc<Validator<I>>> {
        let mut visited = HashSet::new();
        let mut collected = Vec::new();
        self.collect_validators(ty, &mut visited, &mut collected);
        collected
    }

    fn collect_validators(
        &self,
        ty: &TypeKey,
        visited: &mut HashSet<TypeKey>,
        collected: &mut Vec<Arc<Validator<I>>>,
    ) {
        if !visited.insert(ty.clone()) {
            warn!(type_key = %ty, "Model alias cycle detected, stopping lookup");
            return;
        }

        {
            let table = self.validators.read();
            match self.relations.ancestors_of(ty) {
                Some(chain) => {
                    for ancestor in &chain {
                        if let Some(list) = table.get(ancestor) {
                            collected.extend(list.iter().cloned());
                        }
                    }
                }
                None => {
                    if let Some(list) = table.get(ty) {
                        collected.extend(list.iter().cloned());
                    }
                }
            }
        }

        if let Some(origin) = self.relations.model_alias_of(ty) {
            self.collect_validators(&origin, visited, collected);
        }
    }

    /// Returns the number of types with validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.read().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.read().is_empty()
    }
}

impl<I: ?Sized + Typed + 'static> ValidatorRegistry<I> {
    /// Validates `instance` against every validator of its type.
    ///
    /// # Errors
    ///
    /// See [`validation::validate`].
    pub fn validate<'a>(
        &self,
        instance: &'a I,
        args: Option<&Arguments>,
    ) -> Result<&'a I, FieldgateError> {
        let validators = self.get_validators(&instance.type_key());
        validation::validate(instance, validators, args)
    }
}

impl<I: ?Sized + 'static> Default for ValidatorRegistry<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ?Sized + 'static> fmt::Debug for ValidatorRegistry<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.validators.read();
        f.debug_struct("ValidatorRegistry")
            .field("type_count", &table.len())
            .field(
                "validator_count",
                &table.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
