//! Request parameter templates
//!
//! Enrichment descriptors declare their request body as a flat map of
//! parameter name to template. A template string that is exactly one
//! `{{identifier}}` placeholder is substituted; every other value is sent as-is.

use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::FieldValues;

/// Placeholder replaced with the caller-supplied user identity
pub const USER_ID_TOKEN: &str = "USER_ID";

/// Placeholder referring to the field's own value. It has no resolution
/// contract and is passed through as literal text.
pub const THIS_VALUE_TOKEN: &str = "this.value";

/// Extract the identifier of a whole-string `{{identifier}}` placeholder
pub fn placeholder_identifier(template: &str) -> Option<&str> {
    let inner = template.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains('{') || inner.contains('}') {
        return None;
    }
    let ident = inner.trim();
    if ident.is_empty() {
        None
    } else {
        Some(ident)
    }
}

/// Resolve every parameter template against the current answers.
///
/// A placeholder naming an unanswered field is dropped from the result, the
/// same way an undefined value disappears from a serialized JSON body.
pub fn resolve_params(
    param_templates: &Map<String, Value>,
    field_values: &FieldValues,
    user_id: &str,
) -> Map<String, Value> {
    let mut resolved = Map::with_capacity(param_templates.len());

    for (name, template) in param_templates {
        let Value::String(text) = template else {
            resolved.insert(name.clone(), template.clone());
            continue;
        };

        match placeholder_identifier(text) {
            Some(USER_ID_TOKEN) => {
                resolved.insert(name.clone(), Value::String(user_id.to_string()));
            }
            Some(THIS_VALUE_TOKEN) | None => {
                resolved.insert(name.clone(), template.clone());
            }
            Some(field_id) => match field_values.get(field_id) {
                Some(value) => {
                    resolved.insert(name.clone(), value.clone());
                }
                None => debug!(param = %name, field = %field_id, "Template refers to unanswered field, omitting"),
            },
        }
    }

    resolved
}
