//! Validation engine.
//!
//! Runs validators in order, merging every failure into one error. A
//! discarding failure adds its fields to the discarded set; any later
//! validator whose dependencies meet that set is skipped, which is the same
//! as restarting on a filtered sequence after each discard.

use super::{merge_errors, Arguments, Outcome, ValidationError, Validator};
use crate::errors::FieldgateError;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use tracing::{debug, trace};

/// Validates `instance` against `validators`.
///
/// Returns the instance unchanged when every validator passes.
///
/// # Errors
///
/// - [`FieldgateError::Validation`] with every collected failure.
/// - [`FieldgateError::NonTrivialDependency`] as soon as a validator defers,
///   naming that validator.
/// - [`FieldgateError::Assertion`] when arguments are missing for a
///   validator's parameters or a check asserts.
pub fn validate<'a, I, V>(
    instance: &'a I,
    validators: V,
    args: Option<&Arguments>,
) -> Result<&'a I, FieldgateError>
where
    I: ?Sized + 'static,
    V: IntoIterator,
    V::Item: Borrow<Validator<I>>,
{
    let no_args = Arguments::new();
    let args = args.unwrap_or(&no_args);

    let mut error: Option<ValidationError> = None;
    let mut discarded: BTreeSet<String> = BTreeSet::new();

    for item in validators {
        let validator: &Validator<I> = item.borrow();

        if !discarded.is_empty() && !validator.dependencies().is_disjoint(&discarded) {
            trace!(
                validator = validator.name(),
                dependencies = ?validator.dependencies(),
                "Skipping validator depending on discarded fields"
            );
            continue;
        }

        trace!(validator = validator.name(), "Running validator");
        let outcome = if !args.is_empty() && !args.has_exactly(validator.params()) {
            if let Some(missing) = validator.params().iter().find(|p| !args.contains(p)) {
                return Err(FieldgateError::Assertion(format!(
                    "Validator '{}' expects argument '{}' which was not provided",
                    validator.name(),
                    missing
                )));
            }
            validator.invoke(instance, &args.subset(validator.params()))?
        } else {
            validator.invoke(instance, args)?
        };

        match outcome {
            Outcome::Passed => {}
            Outcome::Failed(err) => error = Some(merge_errors(error, err)),
            Outcome::Discarded(discard) => {
                error = Some(merge_errors(error, discard.error));
                discarded.extend(discard.fields);
            }
            Outcome::Deferred(mut dependency) => {
                dependency.validator = Some(validator.name().to_string());
                return Err(dependency.into());
            }
        }
    }

    match error {
        Some(error) if !error.is_empty() => {
            debug!(
                messages = error.messages.len(),
                children = ?error.children.keys().collect::<Vec<_>>(),
                "Validation failed"
            );
            Err(error.into())
        }
        _ => Ok(instance),
    }
}
