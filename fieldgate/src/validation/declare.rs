//! Validator declaration.
//!
//! [`ValidatorBuilder`] is the declaration entry point. Method-style
//! validators whose owner is only known once the type is complete are
//! collected in [`PendingValidators`] and registered by
//! [`PendingValidators::finalize`].

use super::validator::{CheckFn, CheckInfo, CheckResult, Signature, Validator};
use super::{Arguments, YieldedError};
use crate::errors::FieldgateError;
use crate::objects::{FieldRef, TypeKey};
use crate::registry::ValidatorRegistry;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Options accepted when declaring a validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Field failures are re-keyed under.
    pub field: Option<FieldRef>,
    /// Fields whose dependents are skipped on failure.
    ///
    /// `None` defaults to the target field; an empty list disables discarding.
    pub discard: Option<Vec<FieldRef>>,
    /// Explicit owner type.
    pub owner: Option<TypeKey>,
    /// Fields the check reads.
    pub reads: BTreeSet<String>,
}

/// Builder for [`Validator`]s.
#[derive(Debug, Clone)]
pub struct ValidatorBuilder {
    name: String,
    signature: Signature,
    options: ValidatorOptions,
}

impl ValidatorBuilder {
    /// Starts declaring a validator named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            options: ValidatorOptions::default(),
        }
    }

    /// Renames the validator.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Re-keys failures under `field`.
    #[must_use]
    pub fn field(mut self, field: impl Into<FieldRef>) -> Self {
        self.options.field = Some(field.into());
        self
    }

    /// Sets the discard set.
    #[must_use]
    pub fn discard<F: Into<FieldRef>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.options.discard = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the owner type.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<TypeKey>) -> Self {
        self.options.owner = Some(owner.into());
        self
    }

    /// Declares fields the check reads.
    #[must_use]
    pub fn reads<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.options.reads.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Replaces all options.
    #[must_use]
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the current options.
    #[must_use]
    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Builds a validator from a check returning a result.
    pub fn check<I, F>(self, check: F) -> Result<Validator<I>, FieldgateError>
    where
        I: ?Sized + 'static,
        F: Fn(&I, &Arguments) -> CheckResult + Send + Sync + 'static,
    {
        self.build(CheckFn::Returning(Box::new(check)))
    }

    /// Builds a validator from a check reporting any number of problems.
    pub fn yielding<I, F>(self, check: F) -> Result<Validator<I>, FieldgateError>
    where
        I: ?Sized + 'static,
        F: Fn(&I, &Arguments) -> Vec<YieldedError> + Send + Sync + 'static,
    {
        self.build(CheckFn::Yielding(Box::new(check)))
    }

    fn build<I: ?Sized + 'static>(self, check: CheckFn<I>) -> Result<Validator<I>, FieldgateError> {
        let parameters = self.signature.parameters();
        if parameters.is_empty() {
            return Err(FieldgateError::Construction(
                "Validator must have at least one parameter".to_string(),
            ));
        }
        if let Some(p) = parameters.iter().find(|p| p.is_variadic_keyword()) {
            return Err(FieldgateError::Construction(format!(
                "Validator cannot have variadic keyword parameter '{}'",
                p.name
            )));
        }
        if let Some(p) = parameters.iter().find(|p| p.is_variadic_positional()) {
            return Err(FieldgateError::Construction(format!(
                "Validator cannot have variadic positional parameter '{}'",
                p.name
            )));
        }

        let ValidatorOptions {
            field,
            discard,
            owner,
            reads,
        } = self.options;

        if let Some(empty) = field
            .iter()
            .chain(discard.iter().flatten())
            .find(|f| f.as_str().is_empty())
        {
            return Err(FieldgateError::Construction(format!(
                "Invalid field reference '{empty}'"
            )));
        }

        let discard = discard.unwrap_or_else(|| field.iter().cloned().collect());
        let params: BTreeSet<String> = parameters[1..].iter().map(|p| p.name.clone()).collect();

        let info = CheckInfo {
            name: self.name,
            params,
            reads,
        };
        Ok(Validator::from_parts(
            info,
            self.signature,
            check,
            field,
            discard,
            owner,
        ))
    }
}

/// Validators declared before their owner type is complete.
pub struct PendingValidators<I: ?Sized + 'static> {
    validators: Vec<Validator<I>>,
}

impl<I: ?Sized + 'static> PendingValidators<I> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Adds a validator to be bound at finalization.
    ///
    /// # Errors
    ///
    /// Fails if the validator declares its own owner.
    pub fn add(&mut self, validator: Validator<I>) -> Result<&mut Self, FieldgateError> {
        if validator.declared_owner().is_some() {
            return Err(FieldgateError::Configuration(format!(
                "Validator owner cannot be set for class validator '{}'",
                validator.name()
            )));
        }
        self.validators.push(validator);
        Ok(self)
    }

    /// Chaining form of [`add`](Self::add).
    pub fn with(mut self, validator: Validator<I>) -> Result<Self, FieldgateError> {
        self.add(validator)?;
        Ok(self)
    }

    /// Returns the number of pending validators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Registers every pending validator for `owner`, in declaration order.
    ///
    /// # Errors
    ///
    /// Stops at the first registration failure.
    pub fn finalize(
        self,
        registry: &ValidatorRegistry<I>,
        owner: impl Into<TypeKey>,
    ) -> Result<Vec<Arc<Validator<I>>>, FieldgateError> {
        let owner = owner.into();
        self.validators
            .into_iter()
            .map(|validator| registry.register(validator, owner.clone()))
            .collect()
    }
}

impl<I: ?Sized + 'static> Default for PendingValidators<I> {
    fn default() -> Self {
        Self::new()
    }
}
