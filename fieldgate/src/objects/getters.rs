//! Explicit field and alias lookups.

use super::{FieldResolver, FieldSet, ObjectField, TypeKey, Typed};
use crate::errors::FieldgateError;

/// Returns the fields of an instance's type.
pub fn fields_of_instance<T: Typed + ?Sized>(
    resolver: &dyn FieldResolver,
    instance: &T,
    serialization: bool,
) -> Result<FieldSet, FieldgateError> {
    resolver.fields_of(&instance.type_key(), serialization)
}

/// Looks up a field, distinguishing "no such field" (`Ok(None)`) from
/// "not an object type" (`Err`).
pub fn find_field(
    resolver: &dyn FieldResolver,
    ty: &TypeKey,
    name: &str,
) -> Result<Option<ObjectField>, FieldgateError> {
    Ok(resolver.fields_of(ty, false)?.get(name).cloned())
}

/// Returns the field `name` of `ty`.
pub fn get_field(
    resolver: &dyn FieldResolver,
    ty: &TypeKey,
    name: &str,
) -> Result<ObjectField, FieldgateError> {
    find_field(resolver, ty, name)?.ok_or_else(|| FieldgateError::UnknownField {
        ty: ty.clone(),
        field: name.to_string(),
    })
}

/// Returns the public alias of the field `name` of `ty`.
pub fn get_alias(
    resolver: &dyn FieldResolver,
    ty: &TypeKey,
    name: &str,
) -> Result<String, FieldgateError> {
    get_field(resolver, ty, name).map(|field| field.alias)
}

/// Returns `(identifier, alias)` pairs in declaration order.
pub fn aliases_of(
    resolver: &dyn FieldResolver,
    ty: &TypeKey,
    serialization: bool,
) -> Result<Vec<(String, String)>, FieldgateError> {
    Ok(resolver
        .fields_of(ty, serialization)?
        .iter()
        .map(|f| (f.name.clone(), f.alias.clone()))
        .collect())
}
