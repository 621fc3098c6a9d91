//! Validator declaration and execution.
//!
//! This module provides:
//! - The mergeable validation error model
//! - Validator wrapping (yield collection, alias re-keying, discard)
//! - Declaration builders and deferred owner binding
//! - The validation engine

mod arguments;
mod declare;
mod dependencies;
mod engine;
mod error;
#[cfg(test)]
mod integration_tests;
mod validator;

pub use arguments::Arguments;
pub use declare::{PendingValidators, ValidatorBuilder, ValidatorOptions};
#[cfg(test)]
pub use dependencies::MockDependencyResolver;
pub use dependencies::{DeclaredDependencies, DependencyResolver, KnownFieldDependencies};
pub use engine::validate;
pub use error::{merge_errors, LocalizedError, ValidationError, YieldedError};
pub use validator::{
    CheckError, CheckInfo, CheckResult, Discard, Outcome, Parameter, ParameterKind, Signature,
    Validator,
};
