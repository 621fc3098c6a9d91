//! Testing utilities for validators.
//!
//! This module provides:
//! - Assertions over collected validation errors
//! - A dynamically typed record fixture

mod assertions;
mod fixtures;

pub use assertions::{
    assert_child_messages, assert_messages, assert_no_child, assert_validation_failed,
};
pub use fixtures::Record;
