//! Validator wrapping and invocation.
//!
//! A [`Validator`] layers three behaviours around a user check, innermost
//! first:
//! 1. yielded problems are collected into one [`ValidationError`];
//! 2. with a target field, failures are re-keyed under the field's alias;
//! 3. with a discard set, failures become a [`Discard`].

use super::{Arguments, ValidationError, YieldedError};
use crate::errors::{FieldgateError, NonTrivialDependency};
use crate::objects::{FieldRef, FieldResolver, TypeKey};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

static NO_DEPENDENCIES: BTreeSet<String> = BTreeSet::new();

/// Kind of a declared check parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// Ordinary positional parameter.
    Positional,
    /// Keyword parameter.
    Keyword,
    /// Variadic positional parameter.
    VarPositional,
    /// Variadic keyword parameter.
    VarKeyword,
}

/// One declared check parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter kind.
    pub kind: ParameterKind,
    /// Declared type, used to infer a validator's owner.
    pub annotation: Option<TypeKey>,
}

impl Parameter {
    /// Creates a parameter of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotation: None,
        }
    }

    /// Creates a positional parameter.
    #[must_use]
    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Positional)
    }

    /// Creates a keyword parameter.
    #[must_use]
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Keyword)
    }

    /// Sets the declared type.
    #[must_use]
    pub fn typed(mut self, ty: impl Into<TypeKey>) -> Self {
        self.annotation = Some(ty.into());
        self
    }

    pub(crate) fn is_variadic_keyword(&self) -> bool {
        self.kind == ParameterKind::VarKeyword
    }

    pub(crate) fn is_variadic_positional(&self) -> bool {
        self.kind == ParameterKind::VarPositional
    }
}

/// Declared signature of a check; the first parameter is the instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    parameters: Vec<Parameter>,
}

impl Signature {
    /// Creates an empty signature.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signature of a method-style check: one untyped instance parameter.
    #[must_use]
    pub fn method() -> Self {
        Self::new().arg(Parameter::positional("self"))
    }

    /// Signature of a free check whose instance parameter has type `ty`.
    #[must_use]
    pub fn function(ty: impl Into<TypeKey>) -> Self {
        Self::new().arg(Parameter::positional("obj").typed(ty))
    }

    /// Appends a parameter.
    #[must_use]
    pub fn arg(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends a keyword parameter.
    #[must_use]
    pub fn param(self, name: impl Into<String>) -> Self {
        self.arg(Parameter::keyword(name))
    }

    /// Returns all parameters.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns the instance parameter.
    #[must_use]
    pub fn receiver(&self) -> Option<&Parameter> {
        self.parameters.first()
    }
}

/// Failure reported by a check function.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The instance is invalid.
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    /// The instance is partial and the check cannot be evaluated.
    #[error("{0}")]
    NonTrivialDependency(#[from] NonTrivialDependency),

    /// A programmer error inside the check; always propagated.
    #[error("{0}")]
    Assertion(String),

    /// Any other failure; reported as a single message.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CheckError {
    /// Creates an invalid-instance failure with one message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(ValidationError::message(message))
    }

    /// Creates an assertion failure.
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Creates a generic failure.
    #[must_use]
    pub fn other(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Other(anyhow::Error::msg(message))
    }
}

/// Result of a returning check.
pub type CheckResult = Result<(), CheckError>;

type ReturningFn<I> = dyn Fn(&I, &Arguments) -> CheckResult + Send + Sync;
type YieldingFn<I> = dyn Fn(&I, &Arguments) -> Vec<YieldedError> + Send + Sync;

pub(crate) enum CheckFn<I: ?Sized + 'static> {
    Returning(Box<ReturningFn<I>>),
    Yielding(Box<YieldingFn<I>>),
}

impl<I: ?Sized + 'static> CheckFn<I> {
    fn call(&self, instance: &I, args: &Arguments) -> CheckResult {
        match self {
            Self::Returning(check) => check(instance, args),
            Self::Yielding(check) => {
                let yielded = check(instance, args);
                if yielded.is_empty() {
                    Ok(())
                } else {
                    Err(CheckError::Invalid(ValidationError::from_yielded(yielded)))
                }
            }
        }
    }

    fn is_yielding(&self) -> bool {
        matches!(self, Self::Yielding(_))
    }
}

/// What a dependency resolver may inspect about a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInfo {
    /// Validator name.
    pub name: String,
    /// Keyword parameter names.
    pub params: BTreeSet<String>,
    /// Fields the author declared the check reads.
    pub reads: BTreeSet<String>,
}

/// Signal that prunes validators depending on `fields`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discard {
    /// Discarded field identifiers.
    pub fields: BTreeSet<String>,
    /// The failure that caused the discard, already field-keyed.
    pub error: ValidationError,
}

/// Result of invoking one validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The check passed.
    Passed,
    /// The check failed.
    Failed(ValidationError),
    /// The check failed and dependents must be skipped.
    Discarded(Discard),
    /// The check cannot run on a partial instance.
    Deferred(NonTrivialDependency),
}

struct Binding {
    owner: TypeKey,
    dependencies: BTreeSet<String>,
    fields: Arc<dyn FieldResolver>,
}

/// A check bound to at most one owner type.
pub struct Validator<I: ?Sized + 'static> {
    pub(crate) info: CheckInfo,
    pub(crate) signature: Signature,
    pub(crate) check: CheckFn<I>,
    pub(crate) field: Option<FieldRef>,
    pub(crate) discard: Vec<FieldRef>,
    pub(crate) declared_owner: Option<TypeKey>,
    binding: OnceLock<Binding>,
    alias: OnceLock<String>,
    discarded: OnceLock<BTreeSet<String>>,
}

impl<I: ?Sized + 'static> Validator<I> {
    pub(crate) fn from_parts(
        info: CheckInfo,
        signature: Signature,
        check: CheckFn<I>,
        field: Option<FieldRef>,
        discard: Vec<FieldRef>,
        declared_owner: Option<TypeKey>,
    ) -> Self {
        Self {
            info,
            signature,
            check,
            field,
            discard,
            declared_owner,
            binding: OnceLock::new(),
            alias: OnceLock::new(),
            discarded: OnceLock::new(),
        }
    }

    /// Returns the validator name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Returns the keyword parameter names.
    #[must_use]
    pub fn params(&self) -> &BTreeSet<String> {
        &self.info.params
    }

    /// Returns what dependency resolvers see.
    #[must_use]
    pub fn check_info(&self) -> &CheckInfo {
        &self.info
    }

    /// Returns the declared signature.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the target field.
    #[must_use]
    pub fn field(&self) -> Option<&FieldRef> {
        self.field.as_ref()
    }

    /// Returns the discard set as declared.
    #[must_use]
    pub fn discard(&self) -> &[FieldRef] {
        &self.discard
    }

    /// Returns the owner given at declaration, if any.
    #[must_use]
    pub fn declared_owner(&self) -> Option<&TypeKey> {
        self.declared_owner.as_ref()
    }

    /// Returns the registered owner.
    #[must_use]
    pub fn owner(&self) -> Option<&TypeKey> {
        self.binding.get().map(|b| &b.owner)
    }

    /// Returns true once registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.binding.get().is_some()
    }

    /// Returns true for generator-style checks.
    #[must_use]
    pub fn is_yielding(&self) -> bool {
        self.check.is_yielding()
    }

    /// Returns the fields this validator depends on; empty until registered.
    #[must_use]
    pub fn dependencies(&self) -> &BTreeSet<String> {
        self.binding
            .get()
            .map_or(&NO_DEPENDENCIES, |b| &b.dependencies)
    }

    pub(crate) fn bind(
        &self,
        owner: TypeKey,
        dependencies: BTreeSet<String>,
        fields: Arc<dyn FieldResolver>,
    ) -> Result<(), FieldgateError> {
        if let Some(existing) = self.owner() {
            return Err(FieldgateError::AlreadyRegistered {
                validator: self.name().to_string(),
                owner: existing.clone(),
            });
        }
        self.binding
            .set(Binding {
                owner,
                dependencies,
                fields,
            })
            .map_err(|lost| FieldgateError::AlreadyRegistered {
                validator: self.name().to_string(),
                owner: self.owner().cloned().unwrap_or(lost.owner),
            })
    }

    /// Runs the check and applies the re-keying and discard layers.
    ///
    /// # Errors
    ///
    /// Returns [`FieldgateError::Assertion`] when the check asserts.
    pub fn invoke(&self, instance: &I, args: &Arguments) -> Result<Outcome, FieldgateError> {
        let error = match self.check.call(instance, args) {
            Ok(()) => return Ok(Outcome::Passed),
            Err(CheckError::Invalid(error)) => error,
            Err(CheckError::NonTrivialDependency(dep)) => return Ok(Outcome::Deferred(dep)),
            Err(CheckError::Assertion(message)) => return Err(FieldgateError::Assertion(message)),
            Err(CheckError::Other(err)) => {
                return Ok(Outcome::Failed(ValidationError::message(err.to_string())));
            }
        };

        let error = match &self.field {
            Some(field) => match self.alias(field) {
                Ok(alias) => ValidationError::new().with_child(alias.clone(), error),
                Err(lookup) => {
                    return Ok(Outcome::Failed(
                        ValidationError::message(lookup.to_string()).merge(error),
                    ));
                }
            },
            None => error,
        };

        if self.discard.is_empty() {
            Ok(Outcome::Failed(error))
        } else {
            Ok(Outcome::Discarded(Discard {
                fields: self.discarded_fields(),
                error,
            }))
        }
    }

    fn alias(&self, field: &FieldRef) -> Result<&String, FieldgateError> {
        if let Some(alias) = self.alias.get() {
            return Ok(alias);
        }
        let binding = self.binding.get().ok_or_else(|| {
            FieldgateError::Configuration(format!(
                "Validator '{}' is not registered",
                self.name()
            ))
        })?;
        let alias = binding
            .fields
            .fields_of(&binding.owner, false)?
            .resolve(field.as_str())
            .map(|f| f.alias.clone())
            .ok_or_else(|| FieldgateError::UnknownField {
                ty: binding.owner.clone(),
                field: field.to_string(),
            })?;
        Ok(self.alias.get_or_init(|| alias))
    }

    /// Returns the discarded field identifiers, resolving declared names
    /// against the owner's fields. Cached once those fields are known.
    fn discarded_fields(&self) -> BTreeSet<String> {
        if let Some(cached) = self.discarded.get() {
            return cached.clone();
        }
        let Some(binding) = self.binding.get() else {
            return self.discard.iter().map(ToString::to_string).collect();
        };
        let Ok(fields) = binding.fields.fields_of(&binding.owner, false) else {
            return self.discard.iter().map(ToString::to_string).collect();
        };
        let resolved: BTreeSet<String> = self
            .discard
            .iter()
            .map(|r| {
                fields
                    .resolve(r.as_str())
                    .map_or_else(|| r.to_string(), |f| f.name.clone())
            })
            .collect();
        self.discarded.get_or_init(|| resolved).clone()
    }
}

impl<I: ?Sized + 'static> fmt::Debug for Validator<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("name", &self.info.name)
            .field("params", &self.info.params)
            .field("field", &self.field)
            .field("discard", &self.discard)
            .field("owner", &self.owner())
            .field("dependencies", self.dependencies())
            .field("yielding", &self.is_yielding())
            .finish()
    }
}
