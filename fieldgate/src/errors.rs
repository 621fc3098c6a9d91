//! Error types for the fieldgate crate.
//!
//! User-data failures are carried by [`ValidationError`]; everything else
//! here signals misuse of the declaration API or a partial instance and is
//! never merged into validation results.

use crate::objects::TypeKey;
use crate::validation::ValidationError;
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for fieldgate operations.
#[derive(Debug, Error)]
pub enum FieldgateError {
    /// The instance failed validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// A validator needed state the instance does not have yet.
    #[error("{0}")]
    NonTrivialDependency(#[from] NonTrivialDependency),

    /// A validator could not be constructed.
    #[error("Invalid validator: {0}")]
    Construction(String),

    /// A validator was registered twice.
    #[error("Validator '{validator}' already registered for '{owner}'")]
    AlreadyRegistered {
        /// The validator name.
        validator: String,
        /// The type it is already bound to.
        owner: TypeKey,
    },

    /// Declarations are inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The type has no field metadata.
    #[error("Type '{0}' doesn't have fields")]
    UnknownType(TypeKey),

    /// The type has no such field.
    #[error("Type '{ty}' has no field '{field}'")]
    UnknownField {
        /// The object type.
        ty: TypeKey,
        /// The requested field.
        field: String,
    },

    /// A dispatch precondition or a check-level assertion failed.
    #[error("Assertion failed: {0}")]
    Assertion(String),
}

impl FieldgateError {
    /// Returns true for user-data failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the validation error, if this is one.
    #[must_use]
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();

        let kind = match self {
            Self::Validation(err) => {
                map.insert("errors".to_string(), serde_json::json!(err.flatten()));
                "ValidationError"
            }
            Self::NonTrivialDependency(dep) => {
                map.insert("attribute".to_string(), serde_json::json!(dep.attribute));
                map.insert("validator".to_string(), serde_json::json!(dep.validator));
                "NonTrivialDependency"
            }
            Self::Construction(_) => "ConstructionError",
            Self::AlreadyRegistered { validator, owner } => {
                map.insert("validator".to_string(), serde_json::json!(validator));
                map.insert("owner".to_string(), serde_json::json!(owner));
                "AlreadyRegistered"
            }
            Self::Configuration(_) => "ConfigurationError",
            Self::UnknownType(ty) => {
                map.insert("type_key".to_string(), serde_json::json!(ty));
                "UnknownType"
            }
            Self::UnknownField { ty, field } => {
                map.insert("type_key".to_string(), serde_json::json!(ty));
                map.insert("field".to_string(), serde_json::json!(field));
                "UnknownField"
            }
            Self::Assertion(_) => "AssertionError",
        };

        map.insert("type".to_string(), serde_json::json!(kind));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Raised when a validator reads state a partial instance cannot provide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Non-trivial dependency on '{attribute}'")]
pub struct NonTrivialDependency {
    /// The attribute that could not be read.
    pub attribute: String,
    /// The validator that raised it, attached by the engine.
    pub validator: Option<String>,
}

impl NonTrivialDependency {
    /// Creates a new signal for `attribute`.
    #[must_use]
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            validator: None,
        }
    }
}
