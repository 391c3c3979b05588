//! Answer validation
//!
//! Every field keeps at most one error message. All validators are checked in
//! declaration order and a later failure replaces an earlier one, so the last
//! failing validator's message is shown. A validator whose kind does not fit
//! the value's type is skipped rather than failed.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::domain::{all_fields, is_empty_value, Field, FieldValues, QuestionStep, ValidatorRule};

/// Outcome of validating a whole form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Field id -> the single message shown for it
    pub errors: HashMap<String, String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }
}

/// Validate every field of every step against the current answers
pub fn validate(steps: &[QuestionStep], field_values: &FieldValues) -> ValidationReport {
    let errors = all_fields(steps)
        .filter_map(|field| {
            validate_field(field, field_values.get(&field.id)).map(|msg| (field.id.clone(), msg))
        })
        .collect();

    ValidationReport { errors }
}

/// Validate one field's value, returning the message to display if it fails
pub fn validate_field(field: &Field, value: Option<&Value>) -> Option<String> {
    if is_empty_value(value) {
        return field.required.then(|| required_message(field));
    }
    let value = value?;

    field
        .validators
        .iter()
        .filter(|rule| rule_fails(rule, value))
        .last()
        .map(|rule| rule.message().to_string())
}

/// Message recorded for an unanswered required field
pub fn required_message(field: &Field) -> String {
    format!("{} is required", field.prompt)
}

/// Compile a pattern validator so that it must match the whole text
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

fn rule_fails(rule: &ValidatorRule, value: &Value) -> bool {
    match (rule, value) {
        (ValidatorRule::MinLength { value: min, .. }, Value::String(s)) => s.chars().count() < *min,
        (ValidatorRule::MaxLength { value: max, .. }, Value::String(s)) => s.chars().count() > *max,
        (ValidatorRule::Min { value: min, .. }, Value::Number(n)) => n.as_f64().is_some_and(|n| n < *min),
        (ValidatorRule::Max { value: max, .. }, Value::Number(n)) => n.as_f64().is_some_and(|n| n > *max),
        (ValidatorRule::Pattern { value: pattern, .. }, Value::String(s)) => match compile_pattern(pattern) {
            Ok(re) => !re.is_match(s),
            Err(e) => {
                warn!(pattern = %pattern, "Skipping pattern validator that does not compile: {}", e);
                false
            }
        },
        // Type mismatch: the rule does not apply to this value
        _ => false,
    }
}
