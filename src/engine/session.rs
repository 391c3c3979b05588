//! Form session state
//!
//! A [`FormSession`] owns the ephemeral state of one form instance: answers,
//! enriched options, per-field loading and per-field errors. It performs no
//! I/O. Enrichment is split into [`FormSession::begin_enrichment`], which hands
//! back the request to send, and [`FormSession::complete_enrichment`] /
//! [`FormSession::fail_enrichment`], which apply the outcome. Renderers drive
//! the network call with whatever client their platform offers.
//!
//! Each field carries a request sequence number. Only the outcome of the most
//! recently issued request for a field is applied; older ones are discarded
//! as stale.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info};

use super::dependency::is_disabled;
use super::mapper::map_response_to_options;
use super::template::resolve_params;
use super::validation::{validate, ValidationReport};
use crate::domain::{find_field, Field, FieldOption, FieldValues, QuestionStep};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{0}' has no enrichment descriptor")]
    NoEnrichment(String),
}

/// Identifies one issued enrichment request
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnrichmentTicket {
    pub field_id: String,
    pub seq: u64,
}

/// What the renderer must send to load a field's options
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichmentRequest {
    pub ticket: EnrichmentTicket,
    /// Endpoint path from the field's enrichment descriptor
    pub endpoint: String,
    /// JSON body: the resolved parameter templates
    pub body: Map<String, Value>,
}

/// Result of handing an enrichment outcome back to the session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    /// Options were replaced; carries how many were mapped
    Applied { options: usize },
    /// A failure message was recorded for the field
    Failed,
    /// A newer request for the same field was issued; nothing changed
    Stale,
}

/// Rendering state of a single field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldStatus {
    Idle,
    Loading,
    /// Idle with enriched options available
    Loaded,
    /// Idle with an error message to show
    Errored,
}

/// Ephemeral state of one form instance
#[derive(Clone, Debug)]
pub struct FormSession {
    steps: Vec<QuestionStep>,
    user_id: String,
    values: FieldValues,
    options: HashMap<String, Vec<FieldOption>>,
    /// Field id -> sequence number of the request in flight
    loading: HashMap<String, u64>,
    errors: HashMap<String, String>,
    /// Fields whose shown error came from a failed option load
    load_failures: HashSet<String>,
    /// Field id -> last issued sequence number
    issued: HashMap<String, u64>,
}

impl FormSession {
    /// Mount a form: answers start from the declared defaults
    pub fn new(steps: Vec<QuestionStep>, user_id: impl Into<String>) -> Self {
        let values = steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .filter_map(|f| match &f.default {
                Some(Value::Null) | None => None,
                Some(default) => Some((f.id.clone(), default.clone())),
            })
            .collect();

        Self {
            steps,
            user_id: user_id.into(),
            values,
            options: HashMap::new(),
            loading: HashMap::new(),
            errors: HashMap::new(),
            load_failures: HashSet::new(),
            issued: HashMap::new(),
        }
    }

    pub fn steps(&self) -> &[QuestionStep] {
        &self.steps
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn field(&self, field_id: &str) -> Option<&Field> {
        find_field(&self.steps, field_id)
    }

    fn require_field(&self, field_id: &str) -> Result<&Field, SessionError> {
        self.field(field_id)
            .ok_or_else(|| SessionError::UnknownField(field_id.to_string()))
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn value(&self, field_id: &str) -> Option<&Value> {
        self.values.get(field_id)
    }

    /// Record an answer. Clears the field's error immediately; real
    /// re-validation only happens on [`FormSession::validate`] or submit.
    /// Setting `null` removes the answer.
    pub fn set_value(&mut self, field_id: &str, value: Value) -> Result<(), SessionError> {
        self.require_field(field_id)?;

        if value.is_null() {
            self.values.remove(field_id);
        } else {
            self.values.insert(field_id.to_string(), value);
        }
        self.clear_error(field_id);
        Ok(())
    }

    /// Whether the field is gated by an unanswered dependency
    pub fn is_disabled(&self, field: &Field) -> bool {
        is_disabled(field, &self.values)
    }

    // ------------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------------

    /// Options to offer: enriched if loaded, else static, else none
    pub fn options_for<'a>(&'a self, field: &'a Field) -> &'a [FieldOption] {
        self.options
            .get(&field.id)
            .map(Vec::as_slice)
            .or(field.options.as_deref())
            .unwrap_or_default()
    }

    pub fn has_enriched_options(&self, field_id: &str) -> bool {
        self.options.contains_key(field_id)
    }

    pub fn is_loading(&self, field_id: &str) -> bool {
        self.loading.contains_key(field_id)
    }

    pub fn status(&self, field_id: &str) -> FieldStatus {
        if self.is_loading(field_id) {
            FieldStatus::Loading
        } else if self.errors.contains_key(field_id) {
            FieldStatus::Errored
        } else if self.options.contains_key(field_id) {
            FieldStatus::Loaded
        } else {
            FieldStatus::Idle
        }
    }

    /// Start loading a field's options.
    ///
    /// Clears the field's error, marks it loading and returns the request to
    /// send. Issuing again while a request is in flight supersedes it.
    pub fn begin_enrichment(&mut self, field_id: &str) -> Result<EnrichmentRequest, SessionError> {
        let field = self.require_field(field_id)?;
        let enrichment = field
            .enrichment
            .as_ref()
            .ok_or_else(|| SessionError::NoEnrichment(field_id.to_string()))?;

        let endpoint = enrichment.endpoint.clone();
        let body = resolve_params(&enrichment.params, &self.values, &self.user_id);

        let seq = self.issued.entry(field_id.to_string()).or_insert(0);
        *seq += 1;
        let seq = *seq;

        self.loading.insert(field_id.to_string(), seq);
        self.clear_error(field_id);

        debug!(field = %field_id, seq, endpoint = %endpoint, "Issued enrichment request");

        Ok(EnrichmentRequest {
            ticket: EnrichmentTicket {
                field_id: field_id.to_string(),
                seq,
            },
            endpoint,
            body,
        })
    }

    fn is_current(&self, ticket: &EnrichmentTicket) -> bool {
        self.issued.get(&ticket.field_id) == Some(&ticket.seq)
    }

    /// Apply a successful enrichment response
    pub fn complete_enrichment(&mut self, ticket: &EnrichmentTicket, response: &Value) -> EnrichmentOutcome {
        if !self.is_current(ticket) {
            debug!(field = %ticket.field_id, seq = ticket.seq, "Discarding stale enrichment response");
            return EnrichmentOutcome::Stale;
        }
        let Some(mapping) = self
            .field(&ticket.field_id)
            .and_then(|f| f.enrichment.as_ref())
            .map(|e| e.response_mapping.clone())
        else {
            return EnrichmentOutcome::Stale;
        };

        let options = map_response_to_options(response, &mapping);
        let count = options.len();
        info!(field = %ticket.field_id, options = count, "Loaded field options");

        self.loading.remove(&ticket.field_id);
        self.clear_error(&ticket.field_id);
        self.options.insert(ticket.field_id.clone(), options);
        EnrichmentOutcome::Applied { options: count }
    }

    /// Record a failed enrichment call as the field's error
    pub fn fail_enrichment(&mut self, ticket: &EnrichmentTicket, message: impl Into<String>) -> EnrichmentOutcome {
        if !self.is_current(ticket) {
            debug!(field = %ticket.field_id, seq = ticket.seq, "Discarding stale enrichment failure");
            return EnrichmentOutcome::Stale;
        }
        let message = message.into();
        info!(field = %ticket.field_id, "Failed to load field options: {}", message);

        self.loading.remove(&ticket.field_id);
        self.errors.insert(ticket.field_id.clone(), message);
        self.load_failures.insert(ticket.field_id.clone());
        EnrichmentOutcome::Failed
    }

    // ------------------------------------------------------------------------
    // Errors, validation, submission
    // ------------------------------------------------------------------------

    fn clear_error(&mut self, field_id: &str) {
        self.errors.remove(field_id);
        self.load_failures.remove(field_id);
    }

    pub fn error(&self, field_id: &str) -> Option<&str> {
        self.errors.get(field_id).map(String::as_str)
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.errors
    }

    /// Validate the whole form and replace the shown errors with the result.
    ///
    /// A failed option load stays shown on a field that passes validation; it
    /// is only cleared by a new answer or a new load. A validation error on the
    /// same field takes its place.
    pub fn validate(&mut self) -> ValidationReport {
        let report = validate(&self.steps, &self.values);

        let mut errors = report.errors.clone();
        self.load_failures.retain(|id| !errors.contains_key(id));
        for id in &self.load_failures {
            if let Some(message) = self.errors.remove(id) {
                errors.insert(id.clone(), message);
            }
        }
        self.errors = errors;
        report
    }

    /// Validate and, if the form is valid, hand the answers to `on_submit`.
    ///
    /// On failure the errors stay on the session for inline display and the
    /// callback is not called.
    pub fn submit<F>(&mut self, on_submit: F) -> Result<(), ValidationReport>
    where
        F: FnOnce(FieldValues),
    {
        let report = self.validate();
        if !report.is_valid() {
            debug!(errors = report.errors.len(), "Submission blocked by validation errors");
            return Err(report);
        }

        info!(answers = self.values.len(), "Submitting form");
        on_submit(self.values.clone());
        Ok(())
    }

    /// Abandon the form; all entered values are dropped
    pub fn cancel<F>(self, on_cancel: F)
    where
        F: FnOnce(),
    {
        debug!("Form cancelled");
        on_cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnrichmentDescriptor, FieldKind, ResponseMapping, ValidatorRule};
    use serde_json::json;

    fn sheet_form() -> Vec<QuestionStep> {
        let column = Field::new("column", "Email column", FieldKind::Select)
            .required()
            .depends_on(["spreadsheet_id"])
            .with_enrichment(EnrichmentDescriptor {
                endpoint: "/tools/gsuite/sheets/inspect".into(),
                params: json!({ "spreadsheet_id": "{{spreadsheet_id}}", "user_id": "{{USER_ID}}" })
                    .as_object()
                    .cloned()
                    .unwrap(),
                response_mapping: ResponseMapping {
                    items_path: "data.headers".into(),
                    value_path: "$key".into(),
                    label_path: "$value".into(),
                    is_object_entries: true,
                    ..Default::default()
                },
            });

        vec![
            QuestionStep::new(
                0,
                "Read the sheet",
                vec![
                    Field::new("spreadsheet_id", "Spreadsheet ID", FieldKind::Text).required(),
                    column,
                ],
            ),
            QuestionStep::new(
                1,
                "Send the mail",
                vec![
                    Field::new("rows", "Rows", FieldKind::Number)
                        .with_default(5)
                        .with_validator(ValidatorRule::Max { value: 100.0, message: "At most 100 rows".into() }),
                    Field::new("notify", "Notify me", FieldKind::Boolean),
                ],
            ),
        ]
    }

    fn headers() -> Value {
        json!({ "success": true, "data": { "headers": { "A": "Name", "B": "Email" } } })
    }

    #[test]
    fn test_defaults_seed_values() {
        let session = FormSession::new(sheet_form(), "u1");
        assert_eq!(session.value("rows"), Some(&json!(5)));
        assert_eq!(session.value("notify"), None);
    }

    #[test]
    fn test_set_value_unknown_field() {
        let mut session = FormSession::new(sheet_form(), "u1");
        assert_eq!(
            session.set_value("nope", json!("x")),
            Err(SessionError::UnknownField("nope".into()))
        );
    }

    #[test]
    fn test_change_clears_error_optimistically() {
        let mut session = FormSession::new(sheet_form(), "u1");
        session.set_value("rows", json!(500)).unwrap();
        session.validate();
        assert_eq!(session.error("rows"), Some("At most 100 rows"));

        // Still invalid, but the error is cleared until the next validation
        session.set_value("rows", json!(400)).unwrap();
        assert_eq!(session.error("rows"), None);
        session.validate();
        assert_eq!(session.error("rows"), Some("At most 100 rows"));
    }

    #[test]
    fn test_enrichment_request_uses_current_values() {
        let mut session = FormSession::new(sheet_form(), "u42");
        let column = session.field("column").cloned().unwrap();
        assert!(session.is_disabled(&column));

        session.set_value("spreadsheet_id", json!("1Bxi")).unwrap();
        assert!(!session.is_disabled(&column));

        let request = session.begin_enrichment("column").unwrap();
        assert_eq!(request.endpoint, "/tools/gsuite/sheets/inspect");
        assert_eq!(
            Value::Object(request.body),
            json!({ "spreadsheet_id": "1Bxi", "user_id": "u42" })
        );
        assert!(session.is_loading("column"));
        assert_eq!(session.status("column"), FieldStatus::Loading);
    }

    #[test]
    fn test_enrichment_success_populates_options() {
        let mut session = FormSession::new(sheet_form(), "u1");
        let request = session.begin_enrichment("column").unwrap();

        let outcome = session.complete_enrichment(&request.ticket, &headers());
        assert_eq!(outcome, EnrichmentOutcome::Applied { options: 2 });
        assert!(!session.is_loading("column"));
        assert_eq!(session.status("column"), FieldStatus::Loaded);

        let column = session.field("column").cloned().unwrap();
        let labels: Vec<_> = session.options_for(&column).iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, vec!["Name", "Email"]);
    }

    #[test]
    fn test_enrichment_failure_and_reload() {
        let mut session = FormSession::new(sheet_form(), "u1");
        let first = session.begin_enrichment("column").unwrap();
        assert_eq!(session.fail_enrichment(&first.ticket, "HTTP 500"), EnrichmentOutcome::Failed);
        assert_eq!(session.error("column"), Some("HTTP 500"));
        assert_eq!(session.status("column"), FieldStatus::Errored);

        let second = session.begin_enrichment("column").unwrap();
        assert_eq!(session.error("column"), None);
        session.complete_enrichment(&second.ticket, &headers());
        assert_eq!(session.status("column"), FieldStatus::Loaded);
    }

    #[test]
    fn test_load_failure_survives_validation() {
        let mut session = FormSession::new(sheet_form(), "u1");
        session.set_value("spreadsheet_id", json!("1Bxi")).unwrap();
        session.set_value("column", json!("B")).unwrap();

        let reload = session.begin_enrichment("column").unwrap();
        session.fail_enrichment(&reload.ticket, "Sheet not shared");
        assert!(session.validate().is_valid());
        assert_eq!(session.error("column"), Some("Sheet not shared"));
        assert_eq!(session.status("column"), FieldStatus::Errored);

        // A new answer clears it for good
        session.set_value("column", json!("A")).unwrap();
        session.validate();
        assert_eq!(session.error("column"), None);
    }

    #[test]
    fn test_validation_error_replaces_load_failure() {
        let mut session = FormSession::new(sheet_form(), "u1");
        let request = session.begin_enrichment("column").unwrap();
        session.fail_enrichment(&request.ticket, "HTTP 500");

        session.validate();
        assert_eq!(session.error("column"), Some("Email column is required"));

        session.set_value("column", json!("B")).unwrap();
        session.set_value("spreadsheet_id", json!("1Bxi")).unwrap();
        assert!(session.validate().is_valid());
        assert_eq!(session.error("column"), None);
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut session = FormSession::new(sheet_form(), "u1");
        let old = session.begin_enrichment("column").unwrap();
        let new = session.begin_enrichment("column").unwrap();
        assert_ne!(old.ticket, new.ticket);

        let stale = json!({ "data": { "headers": { "Z": "Old" } } });
        assert_eq!(session.complete_enrichment(&old.ticket, &stale), EnrichmentOutcome::Stale);
        assert!(session.is_loading("column"));
        assert!(!session.has_enriched_options("column"));

        session.complete_enrichment(&new.ticket, &headers());
        assert_eq!(session.fail_enrichment(&old.ticket, "late"), EnrichmentOutcome::Stale);
        assert_eq!(session.error("column"), None);
        assert_eq!(session.options.get("column").map(Vec::len), Some(2));
    }

    #[test]
    fn test_begin_enrichment_without_descriptor() {
        let mut session = FormSession::new(sheet_form(), "u1");
        assert_eq!(
            session.begin_enrichment("rows"),
            Err(SessionError::NoEnrichment("rows".into()))
        );
    }

    #[test]
    fn test_options_fall_back_to_static() {
        let picker = Field::new("mode", "Mode", FieldKind::Select)
            .with_options(vec![FieldOption::new("a", "Append"), FieldOption::new("w", "Overwrite")]);
        let bare = Field::new("none", "None", FieldKind::Select);
        let session = FormSession::new(vec![QuestionStep::new(0, "", vec![picker.clone(), bare.clone()])], "u1");

        assert_eq!(session.options_for(&picker).len(), 2);
        assert!(session.options_for(&bare).is_empty());
    }

    #[test]
    fn test_submit_blocked_then_delivered_once() {
        let mut session = FormSession::new(sheet_form(), "u1");
        let mut calls = Vec::new();

        let blocked = session.submit(|values| calls.push(values));
        let report = blocked.unwrap_err();
        assert_eq!(report.error_for("spreadsheet_id"), Some("Spreadsheet ID is required"));
        assert_eq!(report.error_for("column"), Some("Email column is required"));
        assert!(calls.is_empty());

        session.set_value("spreadsheet_id", json!("1Bxi")).unwrap();
        session.set_value("column", json!("B")).unwrap();
        session.set_value("notify", json!(false)).unwrap();

        session.submit(|values| calls.push(values)).unwrap();
        assert_eq!(calls.len(), 1);
        let submitted = &calls[0];
        assert_eq!(submitted.len(), 4);
        assert_eq!(submitted["column"], json!("B"));
        assert_eq!(submitted["rows"], json!(5));
        assert_eq!(submitted["notify"], json!(false));
        assert!(session.errors().is_empty());
    }

    #[test]
    fn test_cancel_calls_callback() {
        let session = FormSession::new(sheet_form(), "u1");
        let mut cancelled = false;
        session.cancel(|| cancelled = true);
        assert!(cancelled);
    }
}
