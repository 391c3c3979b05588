//! HTTP enrichment client
//!
//! Sends the body built by [`FormSession::begin_enrichment`] as a JSON POST to
//! the backend and feeds the outcome back into the session.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::domain::{self, BackendFailure};
use crate::engine::{EnrichmentOutcome, FormSession, SessionError};

/// Errors from an enrichment call
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Could not reach the backend or the request timed out
    #[error("Request failed: {0}")]
    Transport(String),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Backend answered 200 with `"success": false`
    #[error("{message}")]
    Backend { message: String, retryable: bool },

    /// Response body was not JSON
    #[error("Invalid response: {0}")]
    Decode(String),
}

impl From<BackendFailure> for EnrichmentError {
    fn from(failure: BackendFailure) -> Self {
        EnrichmentError::Backend {
            message: failure.message,
            retryable: failure.retryable,
        }
    }
}

impl EnrichmentError {
    /// Whether trying again later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            EnrichmentError::Transport(_) => true,
            EnrichmentError::Status { status, .. } => *status >= 500 || *status == 429,
            EnrichmentError::Backend { retryable, .. } => *retryable,
            EnrichmentError::Decode(_) => false,
        }
    }
}

/// Something that can answer an enrichment request
#[async_trait]
pub trait OptionsSource: Send + Sync {
    /// POST `body` to `endpoint` and return the decoded JSON response
    async fn fetch(
        &self,
        endpoint: &str,
        body: &Map<String, Value>,
        credential: Option<&str>,
    ) -> Result<Value, EnrichmentError>;
}

/// reqwest-backed [`OptionsSource`]
pub struct HttpEnrichmentClient {
    client: Client,
    base_url: String,
}

impl HttpEnrichmentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, EnrichmentError> {
        Self::new(
            settings.backend.base_url.clone(),
            Duration::from_secs(settings.backend.timeout_seconds),
        )
    }

    /// Absolute URL for an endpoint; absolute endpoints are used as given
    pub fn url_for(&self, endpoint: &str) -> String {
        domain::endpoint_url(&self.base_url, endpoint)
    }
}

#[async_trait]
impl OptionsSource for HttpEnrichmentClient {
    async fn fetch(
        &self,
        endpoint: &str,
        body: &Map<String, Value>,
        credential: Option<&str>,
    ) -> Result<Value, EnrichmentError> {
        let url = self.url_for(endpoint);
        debug!(url = %url, "Sending enrichment request");

        let mut req_builder = self.client.post(&url).json(body);
        if let Some(token) = credential {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| EnrichmentError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status { status, body });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Decode(e.to_string()))?;

        check_envelope(json)
    }
}

/// Reject a `{"success": false, "error": ...}` envelope; pass anything else through
pub fn check_envelope(response: Value) -> Result<Value, EnrichmentError> {
    Ok(domain::check_envelope(response)?)
}

/// Run one enrichment round trip for `field_id` and apply the result to the session
pub async fn load_options(
    session: &mut FormSession,
    field_id: &str,
    source: &dyn OptionsSource,
    credential: Option<&str>,
) -> Result<EnrichmentOutcome, SessionError> {
    let request = session.begin_enrichment(field_id)?;

    let outcome = match source.fetch(&request.endpoint, &request.body, credential).await {
        Ok(response) => session.complete_enrichment(&request.ticket, &response),
        Err(e) => {
            warn!(field = %field_id, retryable = e.is_retryable(), "Enrichment failed: {}", e);
            session.fail_enrichment(&request.ticket, e.to_string())
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnrichmentDescriptor, Field, FieldKind, QuestionStep, ResponseMapping};
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedSource {
        response: Result<Value, String>,
        seen: Mutex<Vec<(String, Map<String, Value>, Option<String>)>>,
    }

    impl CannedSource {
        fn new(response: Result<Value, String>) -> Self {
            Self {
                response,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OptionsSource for CannedSource {
        async fn fetch(
            &self,
            endpoint: &str,
            body: &Map<String, Value>,
            credential: Option<&str>,
        ) -> Result<Value, EnrichmentError> {
            self.seen.lock().unwrap().push((
                endpoint.to_string(),
                body.clone(),
                credential.map(str::to_string),
            ));
            self.response
                .clone()
                .map_err(|status| EnrichmentError::Status { status: 500, body: status })
        }
    }

    fn labels_form() -> FormSession {
        let field = Field::new("label", "Label", FieldKind::Select).with_enrichment(EnrichmentDescriptor {
            endpoint: "/tools/gsuite/gmail/labels".into(),
            params: json!({ "user_id": "{{USER_ID}}" }).as_object().cloned().unwrap(),
            response_mapping: ResponseMapping {
                items_path: "data.labels".into(),
                value_path: "id".into(),
                label_path: "name".into(),
                ..Default::default()
            },
        });
        FormSession::new(vec![QuestionStep::new(0, "", vec![field])], "u9")
    }

    #[test]
    fn test_url_join() {
        let client = HttpEnrichmentClient::new("http://localhost:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url_for("/tools/x"), "http://localhost:8000/tools/x");
        assert_eq!(client.url_for("tools/x"), "http://localhost:8000/tools/x");
        assert_eq!(client.url_for("https://other/x"), "https://other/x");
    }

    #[test]
    fn test_envelope() {
        assert!(check_envelope(json!({ "success": true, "data": [] })).is_ok());
        assert!(check_envelope(json!([1, 2])).is_ok());

        let err = check_envelope(json!({ "success": false, "error": "Sheet not shared", "retryable": true }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Sheet not shared");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_load_options_applies_response() {
        let mut session = labels_form();
        let source = CannedSource::new(Ok(json!({
            "data": { "labels": [{ "id": "L1", "name": "Inbox" }, { "id": "L2", "name": "Work" }] }
        })));

        let outcome = load_options(&mut session, "label", &source, Some("tok")).await.unwrap();
        assert_eq!(outcome, EnrichmentOutcome::Applied { options: 2 });

        let seen = source.seen.lock().unwrap();
        assert_eq!(seen[0].0, "/tools/gsuite/gmail/labels");
        assert_eq!(Value::Object(seen[0].1.clone()), json!({ "user_id": "u9" }));
        assert_eq!(seen[0].2.as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_load_options_records_failure() {
        let mut session = labels_form();
        let source = CannedSource::new(Err("boom".into()));

        let outcome = load_options(&mut session, "label", &source, None).await.unwrap();
        assert_eq!(outcome, EnrichmentOutcome::Failed);
        assert_eq!(session.error("label"), Some("HTTP 500: boom"));
        assert!(!session.is_loading("label"));
    }

    #[tokio::test]
    async fn test_load_options_unknown_field() {
        let mut session = labels_form();
        let source = CannedSource::new(Ok(json!([])));
        assert!(load_options(&mut session, "ghost", &source, None).await.is_err());
        assert!(source.seen.lock().unwrap().is_empty());
    }
}
