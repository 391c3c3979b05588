//! Question form schema types
//!
//! These types mirror the question steps the backend proposes for a workflow
//! draft. They are immutable inputs: the form session reads them but never
//! mutates them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Current answers keyed by field id
pub type FieldValues = HashMap<String, Value>;

// ============================================================================
// Field Kind
// ============================================================================

/// Closed set of input kinds a field can render as.
///
/// Renderers must `match` on this exhaustively so that adding a kind is a
/// compile error everywhere a widget is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Short free text
    Text,
    /// Numeric input
    Number,
    /// On/off toggle
    Boolean,
    /// Pick one of a list of options (static or enriched)
    #[serde(alias = "option_picker")]
    Select,
}

impl FieldKind {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "Text",
            FieldKind::Number => "Number",
            FieldKind::Boolean => "Yes / No",
            FieldKind::Select => "Choice",
        }
    }
}

// ============================================================================
// Validators
// ============================================================================

/// One constraint rule attached to a field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorRule {
    /// Text must have at least `value` characters
    MinLength { value: usize, message: String },
    /// Text must have at most `value` characters
    MaxLength { value: usize, message: String },
    /// Number must be >= `value`
    Min { value: f64, message: String },
    /// Number must be <= `value`
    Max { value: f64, message: String },
    /// Text must match the regular expression as a whole
    Pattern { value: String, message: String },
}

impl ValidatorRule {
    /// Human-readable failure message
    pub fn message(&self) -> &str {
        match self {
            ValidatorRule::MinLength { message, .. }
            | ValidatorRule::MaxLength { message, .. }
            | ValidatorRule::Min { message, .. }
            | ValidatorRule::Max { message, .. }
            | ValidatorRule::Pattern { message, .. } => message,
        }
    }

    /// Kind tag as it appears on the wire
    pub fn kind_name(&self) -> &'static str {
        match self {
            ValidatorRule::MinLength { .. } => "min_length",
            ValidatorRule::MaxLength { .. } => "max_length",
            ValidatorRule::Min { .. } => "min",
            ValidatorRule::Max { .. } => "max",
            ValidatorRule::Pattern { .. } => "pattern",
        }
    }

    /// Whether the rule checks text values (as opposed to numbers)
    pub fn applies_to_text(&self) -> bool {
        matches!(
            self,
            ValidatorRule::MinLength { .. } | ValidatorRule::MaxLength { .. } | ValidatorRule::Pattern { .. }
        )
    }
}

// ============================================================================
// Options and Enrichment
// ============================================================================

/// One selectable choice for an option-picker field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    /// The stored answer
    pub value: Value,
    /// Human text
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example values, e.g. the first rows of a spreadsheet column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<String>>,
}

impl FieldOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description: None,
            samples: None,
        }
    }
}

/// Declarative description of how to turn a JSON payload into options
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMapping {
    /// Path to the array (or keyed object) of raw items
    pub items_path: String,
    /// Path or special token (`$key`, `$value`, `$index`, `$item`) for the option value
    pub value_path: String,
    /// Path or special token for the option label
    pub label_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples_path: Option<String>,
    /// The items are a keyed object and must be turned into `[key, value]` pairs first
    #[serde(default)]
    pub is_object_entries: bool,
}

/// How to fetch dynamic options for an option-picker field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentDescriptor {
    /// Backend endpoint path, e.g. `/tools/gsuite/sheets/inspect`
    pub endpoint: String,
    /// Request parameter name -> template string (or literal JSON value)
    #[serde(default)]
    pub params: Map<String, Value>,
    pub response_mapping: ResponseMapping,
}

// ============================================================================
// Field and Step
// ============================================================================

/// A single question in a form step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Stable identifier, also the key in the submitted answers
    pub id: String,
    /// Prompt text shown to the user
    #[serde(alias = "question")]
    pub prompt: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Ids of fields that must be answered before this one is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_until: Option<Vec<String>>,
    #[serde(default, alias = "validation", skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentDescriptor>,
    /// Static choices, used when no enrichment applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

impl Field {
    /// Create a field with no constraints
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind,
            required: false,
            default: None,
            disabled_until: None,
            validators: Vec::new(),
            enrichment: None,
            options: None,
            placeholder: None,
            help_text: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn depends_on<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disabled_until = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_validator(mut self, rule: ValidatorRule) -> Self {
        self.validators.push(rule);
        self
    }

    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_enrichment(mut self, enrichment: EnrichmentDescriptor) -> Self {
        self.enrichment = Some(enrichment);
        self
    }

    /// True for an option picker with neither enrichment nor static options
    pub fn has_no_option_source(&self) -> bool {
        self.kind == FieldKind::Select
            && self.enrichment.is_none()
            && self.options.as_ref().map_or(true, |o| o.is_empty())
    }
}

/// An ordered group of fields presented together
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionStep {
    pub step_index: usize,
    #[serde(default)]
    pub description: String,
    #[serde(alias = "questions")]
    pub fields: Vec<Field>,
}

impl QuestionStep {
    pub fn new(step_index: usize, description: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            step_index,
            description: description.into(),
            fields,
        }
    }
}

/// Iterate every field across every step in declaration order
pub fn all_fields(steps: &[QuestionStep]) -> impl Iterator<Item = &Field> {
    steps.iter().flat_map(|s| s.fields.iter())
}

/// Find a field by id across all steps
pub fn find_field<'a>(steps: &'a [QuestionStep], id: &str) -> Option<&'a Field> {
    all_fields(steps).find(|f| f.id == id)
}

// ============================================================================
// Value helpers
// ============================================================================

/// Emptiness rule shared by dependency gating and the required check.
///
/// Absent, null, and whitespace-only text are empty. Numeric zero, `false`,
/// and any non-blank text are present.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// Render a JSON value as display text: strings as-is, everything else compact JSON
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
