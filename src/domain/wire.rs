//! Backend wire helpers shared by every client
//!
//! The native HTTP client and the browser form both talk to the same backend,
//! so the steps document shape, the endpoint URL join and the tool-response
//! envelope check live here, outside any platform feature.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::QuestionStep;

const FALLBACK_FAILURE: &str = "Backend reported a failure";

/// A steps document: a bare list or `{ "steps": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StepsDocument {
    List(Vec<QuestionStep>),
    Wrapped { steps: Vec<QuestionStep> },
}

impl From<StepsDocument> for Vec<QuestionStep> {
    fn from(doc: StepsDocument) -> Self {
        match doc {
            StepsDocument::List(steps) | StepsDocument::Wrapped { steps } => steps,
        }
    }
}

/// A `{"success": false}` tool response
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendFailure {
    pub message: String,
    pub retryable: bool,
}

/// Reject a `{"success": false, "error": ...}` envelope; pass anything else through
pub fn check_envelope(response: Value) -> Result<Value, BackendFailure> {
    if response.get("success").and_then(Value::as_bool) != Some(false) {
        return Ok(response);
    }
    let message = response
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or(FALLBACK_FAILURE)
        .to_string();
    let retryable = response
        .get("retryable")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Err(BackendFailure { message, retryable })
}

/// URL for an endpoint under `base_url`; absolute endpoints are used as given
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
