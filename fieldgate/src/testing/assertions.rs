//! Test assertions for validation errors.

use crate::errors::FieldgateError;
use crate::validation::ValidationError;

/// Asserts that the error carries exactly `expected` top-level messages.
pub fn assert_messages(error: &ValidationError, expected: &[&str]) {
    let actual: Vec<&str> = error.messages.iter().map(String::as_str).collect();
    assert_eq!(
        actual, expected,
        "Expected messages {expected:?}, got {actual:?}"
    );
}

/// Asserts that the child at `key` carries exactly `expected` messages.
pub fn assert_child_messages(error: &ValidationError, key: &str, expected: &[&str]) {
    let Some(child) = error.child(key) else {
        panic!(
            "Expected child '{}', found keys {:?}",
            key,
            error.children.keys().collect::<Vec<_>>()
        );
    };
    assert_messages(child, expected);
}

/// Asserts that the error has no child at `key`.
pub fn assert_no_child(error: &ValidationError, key: &str) {
    assert!(
        error.child(key).is_none(),
        "Expected no child '{key}', but found {:?}",
        error.child(key)
    );
}

/// Asserts that a validation result failed with a data error and returns it.
pub fn assert_validation_failed<T: std::fmt::Debug>(
    result: Result<T, FieldgateError>,
) -> ValidationError {
    match result {
        Err(FieldgateError::Validation(error)) => error,
        other => panic!("Expected validation failure, got {other:?}"),
    }
}
