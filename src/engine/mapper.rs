//! Response-to-options mapping
//!
//! Turns an arbitrary enrichment payload into a normalized option list using
//! a declarative [`ResponseMapping`]. Mapping failures are never surfaced to
//! the caller as errors: they are logged and produce an empty list.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::path::resolve;
use crate::domain::{value_to_text, FieldOption, ResponseMapping};

/// Special `value_path`/`label_path` tokens
pub const KEY_TOKEN: &str = "$key";
pub const VALUE_TOKEN: &str = "$value";
pub const INDEX_TOKEN: &str = "$index";
pub const ITEM_TOKEN: &str = "$item";

/// Why a payload could not be turned into options
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("items path '{0}' did not resolve to a value")]
    ItemsNotFound(String),

    #[error("value at items path '{path}' is {found}, expected an array")]
    NotASequence { path: String, found: &'static str },
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map a response to options, logging and returning an empty list on failure
pub fn map_response_to_options(response: &Value, mapping: &ResponseMapping) -> Vec<FieldOption> {
    match try_map_response_to_options(response, mapping) {
        Ok(options) => options,
        Err(e) => {
            warn!(items_path = %mapping.items_path, "Failed to map response to options: {}", e);
            Vec::new()
        }
    }
}

/// Map a response to options, reporting why the payload did not fit
pub fn try_map_response_to_options(
    response: &Value,
    mapping: &ResponseMapping,
) -> Result<Vec<FieldOption>, MappingError> {
    let raw = resolve(response, &mapping.items_path)
        .ok_or_else(|| MappingError::ItemsNotFound(mapping.items_path.clone()))?;

    let entries;
    let items: &[Value] = match raw {
        Value::Array(items) => items,
        Value::Object(map) if mapping.is_object_entries => {
            entries = map
                .iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k.clone()), v.clone()]))
                .collect::<Vec<_>>();
            &entries
        }
        other => {
            return Err(MappingError::NotASequence {
                path: mapping.items_path.clone(),
                found: type_name(other),
            })
        }
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| build_option(item, i, mapping))
        .collect())
}

fn build_option(item: &Value, index: usize, mapping: &ResponseMapping) -> FieldOption {
    let value = extract(item, &mapping.value_path, index).unwrap_or(Value::Null);
    let label = extract(item, &mapping.label_path, index)
        .map(|v| value_to_text(&v))
        .unwrap_or_default();

    let description = mapping
        .description_path
        .as_deref()
        .and_then(|p| extract(item, p, index))
        .filter(|v| !v.is_null())
        .map(|v| value_to_text(&v));

    let samples = mapping
        .samples_path
        .as_deref()
        .and_then(|p| extract(item, p, index))
        .and_then(|v| match v {
            Value::Array(items) => Some(items.iter().map(value_to_text).collect()),
            _ => None,
        });

    FieldOption {
        value,
        label,
        description,
        samples,
    }
}

/// Pull one datum out of an item by path or special token
fn extract(item: &Value, path: &str, index: usize) -> Option<Value> {
    let pair = match item {
        Value::Array(parts) if parts.len() == 2 => Some((&parts[0], &parts[1])),
        _ => None,
    };

    match path {
        KEY_TOKEN => Some(match pair {
            Some((k, _)) => k.clone(),
            None => Value::String(value_to_text(item)),
        }),
        VALUE_TOKEN => Some(match pair {
            Some((_, v)) => v.clone(),
            None => Value::String(value_to_text(item)),
        }),
        INDEX_TOKEN => Some(Value::String(index.to_string())),
        ITEM_TOKEN => Some(Value::String(value_to_text(item))),
        other => resolve(item, other).cloned(),
    }
}
