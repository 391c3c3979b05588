use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::{BackendSettings, Settings};
use crate::domain::{all_fields, Field, FieldKind, QuestionStep};
use crate::engine::validation::compile_pattern;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cross-reference error: {0}")]
    CrossReference(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_backend(&settings.backend) {
            errors.extend(e);
        }

        if !matches!(
            settings.log_level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            errors.push(ValidationError::InvalidValue {
                field: "log_level".to_string(),
                reason: format!("'{}' is not one of trace, debug, info, warn, error", settings.log_level),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_backend(backend: &BackendSettings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if backend.base_url.is_empty() {
            errors.push(ValidationError::MissingField("backend.base_url".to_string()));
        } else if !(backend.base_url.starts_with("http://") || backend.base_url.starts_with("https://")) {
            errors.push(ValidationError::InvalidValue {
                field: "backend.base_url".to_string(),
                reason: "URL must start with http:// or https://".to_string(),
            });
        }

        if backend.timeout_seconds == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "backend.timeout_seconds".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// Question schema checks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The form cannot behave as declared
    Error,
    /// The form works but a field is probably misconfigured
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub severity: Severity,
    pub error: ValidationError,
}

/// Static checks over a list of question steps
pub struct SchemaValidator;

impl SchemaValidator {
    /// Check the steps and return every issue found, errors and warnings alike
    pub fn check(steps: &[QuestionStep]) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();
        let mut seen_ids: HashMap<&str, usize> = HashMap::new();

        for (idx, field) in all_fields(steps).enumerate() {
            if field.id.trim().is_empty() {
                issues.push(Self::error(ValidationError::MissingField(format!("fields[{}].id", idx))));
            }
            if let Some(prev_idx) = seen_ids.insert(&field.id, idx) {
                issues.push(Self::error(ValidationError::Duplicate(format!(
                    "Field id '{}' appears at positions {} and {}",
                    field.id, prev_idx, idx
                ))));
            }
            if field.prompt.trim().is_empty() {
                issues.push(Self::warning(ValidationError::MissingField(format!("{}.prompt", field.id))));
            }

            Self::check_validators(field, &mut issues);
            Self::check_options(field, &mut issues);
        }

        Self::check_dependencies(steps, &mut issues);

        let mut seen_steps = HashSet::new();
        for step in steps {
            if !seen_steps.insert(step.step_index) {
                issues.push(Self::warning(ValidationError::Duplicate(format!(
                    "Step index {} is used more than once",
                    step.step_index
                ))));
            }
        }

        issues
    }

    /// Only the error-level issues, in the shape `ConfigValidator` returns
    pub fn validate(steps: &[QuestionStep]) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<_> = Self::check(steps)
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.error)
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn error(error: ValidationError) -> SchemaIssue {
        SchemaIssue { severity: Severity::Error, error }
    }

    fn warning(error: ValidationError) -> SchemaIssue {
        SchemaIssue { severity: Severity::Warning, error }
    }

    fn check_validators(field: &Field, issues: &mut Vec<SchemaIssue>) {
        for rule in &field.validators {
            if let crate::domain::ValidatorRule::Pattern { value, .. } = rule {
                if let Err(e) = compile_pattern(value) {
                    issues.push(Self::error(ValidationError::InvalidValue {
                        field: format!("{}.validators.pattern", field.id),
                        reason: e.to_string(),
                    }));
                }
            }

            let applies = match field.kind {
                FieldKind::Text | FieldKind::Select => rule.applies_to_text(),
                FieldKind::Number => !rule.applies_to_text(),
                FieldKind::Boolean => false,
            };
            if !applies {
                issues.push(Self::warning(ValidationError::InvalidValue {
                    field: format!("{}.validators.{}", field.id, rule.kind_name()),
                    reason: format!("never applies to a {} field", field.kind.display_name()),
                }));
            }
        }
    }

    fn check_options(field: &Field, issues: &mut Vec<SchemaIssue>) {
        if field.has_no_option_source() {
            issues.push(Self::warning(ValidationError::InvalidValue {
                field: field.id.clone(),
                reason: "option picker has neither enrichment nor static options".to_string(),
            }));
        }

        if field.kind != FieldKind::Select && (field.enrichment.is_some() || field.options.is_some()) {
            issues.push(Self::warning(ValidationError::InvalidValue {
                field: field.id.clone(),
                reason: format!("options are ignored on a {} field", field.kind.display_name()),
            }));
        }

        if let Some(enrichment) = &field.enrichment {
            if enrichment.endpoint.trim().is_empty() {
                issues.push(Self::error(ValidationError::MissingField(format!(
                    "{}.enrichment.endpoint",
                    field.id
                ))));
            }
            let mapping = &enrichment.response_mapping;
            if mapping.value_path.is_empty() || mapping.label_path.is_empty() {
                issues.push(Self::error(ValidationError::MissingField(format!(
                    "{}.enrichment.response_mapping.value_path/label_path",
                    field.id
                ))));
            }
        }
    }

    fn check_dependencies(steps: &[QuestionStep], issues: &mut Vec<SchemaIssue>) {
        let known: HashSet<&str> = all_fields(steps).map(|f| f.id.as_str()).collect();
        let graph: HashMap<&str, Vec<&str>> = all_fields(steps)
            .map(|f| {
                let deps = f
                    .disabled_until
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(String::as_str)
                    .collect();
                (f.id.as_str(), deps)
            })
            .collect();

        for field in all_fields(steps) {
            for dep in field.disabled_until.as_deref().unwrap_or_default() {
                if dep == &field.id {
                    issues.push(Self::error(ValidationError::CrossReference(format!(
                        "Field '{}' depends on itself",
                        field.id
                    ))));
                } else if !known.contains(dep.as_str()) {
                    issues.push(Self::error(ValidationError::CrossReference(format!(
                        "Field '{}' depends on unknown field '{}'",
                        field.id, dep
                    ))));
                }
            }
        }

        // A cycle longer than one edge keeps every field in it disabled forever
        for field in all_fields(steps) {
            if Self::reaches(&graph, field.id.as_str(), field.id.as_str(), &mut HashSet::new(), true) {
                issues.push(Self::error(ValidationError::CrossReference(format!(
                    "Field '{}' is part of a dependency cycle",
                    field.id
                ))));
            }
        }
    }

    fn reaches<'a>(
        graph: &HashMap<&'a str, Vec<&'a str>>,
        from: &'a str,
        target: &str,
        visited: &mut HashSet<&'a str>,
        first: bool,
    ) -> bool {
        if !first && from == target {
            return true;
        }
        if !visited.insert(from) {
            return false;
        }
        graph
            .get(from)
            .into_iter()
            .flatten()
            .filter(|next| !(first && **next == target))
            .any(|next| Self::reaches(graph, next, target, visited, false))
    }
}
