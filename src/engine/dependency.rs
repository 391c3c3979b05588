//! Dependency gating: a field stays disabled until every field it lists in
//! `disabled_until` has a non-empty answer.

use crate::domain::{is_empty_value, Field, FieldValues};

/// True when any declared dependency is still empty
pub fn is_disabled(field: &Field, field_values: &FieldValues) -> bool {
    field
        .disabled_until
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|dep| is_empty_value(field_values.get(dep)))
}

/// Ids of the dependencies still blocking `field`, in declaration order
pub fn blocking_dependencies<'a>(field: &'a Field, field_values: &FieldValues) -> Vec<&'a str> {
    field
        .disabled_until
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter(|dep| is_empty_value(field_values.get(dep.as_str())))
        .map(String::as_str)
        .collect()
}
