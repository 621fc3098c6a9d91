//! # Fieldgate
//!
//! Declarative, field-aware validation for structured objects.
//!
//! Fieldgate runs user-written checks against object instances and collects
//! every failure into one structured error:
//!
//! - **Field-keyed errors**: failures of a check targeting a field are nested
//!   under that field's public alias
//! - **Dependency pruning**: a failed field discards later checks that read it
//! - **Inheritance**: checks declared on ancestors and model aliases apply to
//!   derived types
//! - **Partial dispatch**: extra arguments are routed to the checks declaring
//!   them
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldgate::prelude::*;
//!
//! let registry: ValidatorRegistry<Record> = ValidatorRegistry::builder()
//!     .fields(Arc::new(catalog))
//!     .build();
//!
//! registry.register(
//!     ValidatorBuilder::new("positive_qty", Signature::method())
//!         .field("qty")
//!         .check(|order: &Record, _| match order.get_i64("qty") {
//!             Some(q) if q > 0 => Ok(()),
//!             _ => Err(CheckError::invalid("must be positive")),
//!         })?,
//!     "Order",
//! )?;
//!
//! registry.validate(&order, None)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod errors;
pub mod objects;
pub mod registry;
pub mod testing;
pub mod validation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::{FieldgateError, NonTrivialDependency};
    pub use crate::objects::{
        CachedFieldResolver, FieldCatalog, FieldRef, FieldResolver, FieldSet, ObjectField,
        TypeHierarchy, TypeKey, TypeRelations, Typed,
    };
    pub use crate::registry::{RegistryBuilder, ValidatorRegistry};
    pub use crate::testing::Record;
    pub use crate::validation::{
        validate, Arguments, CheckError, CheckResult, DependencyResolver, Outcome,
        PendingValidators, Signature, ValidationError, Validator, ValidatorBuilder,
        ValidatorOptions, YieldedError,
    };
}
