//! HTTP calls made by the browser form

use gloo_net::http::Request;
use serde_json::{Map, Value};
use vidflow::domain::{check_envelope, endpoint_url, QuestionStep, StepsDocument};

/// Fetch a steps document: a bare list or `{ "steps": [...] }`
pub async fn fetch_steps(url: &str) -> Result<Vec<QuestionStep>, String> {
    let response = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.ok() {
        return Err(format!("HTTP {} while loading {}", response.status(), url));
    }

    let doc: StepsDocument = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse steps: {}", e))?;

    Ok(doc.into())
}

/// POST an enrichment body and return the raw JSON payload.
///
/// A `{"success": false}` envelope is reported as an error, like a failed status.
pub async fn post_enrichment(
    base_url: &str,
    endpoint: &str,
    body: &Map<String, Value>,
    token: Option<&str>,
) -> Result<Value, String> {
    let url = endpoint_url(base_url, endpoint);

    let mut builder = Request::post(&url);
    if let Some(token) = token {
        builder = builder.header("Authorization", &format!("Bearer {}", token));
    }

    let response = builder
        .json(body)
        .map_err(|e| format!("Failed to serialize body: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Request failed: {}", e))?;

    if !response.ok() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(format!("HTTP {}: {}", status, text));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| format!("Failed to parse response: {}", e))?;

    check_envelope(payload).map_err(|failure| {
        log::warn!("Enrichment failed for {} (retryable: {}): {}", url, failure.retryable, failure);
        failure.to_string()
    })
}
