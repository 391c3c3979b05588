use serde_json::json;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use vidflow::adapters::{load_options, HttpEnrichmentClient};
use vidflow::config::load_steps;
use vidflow::engine::{EnrichmentOutcome, FieldStatus, FormSession};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STEPS: &str = r#"{
  "steps": [
    {
      "step_index": 0,
      "description": "Read the contact sheet",
      "questions": [
        { "id": "spreadsheet_id", "question": "Spreadsheet ID", "type": "text", "required": true,
          "validation": [{ "type": "pattern", "value": "[A-Za-z0-9_-]{4,}", "message": "That does not look like a sheet ID" }] },
        { "id": "email_column", "question": "Email column", "type": "select", "required": true,
          "disabled_until": ["spreadsheet_id"],
          "enrichment": {
            "endpoint": "/tools/gsuite/sheets/inspect",
            "params": { "spreadsheet_id": "{{spreadsheet_id}}", "user_id": "{{USER_ID}}", "sample_rows": 3 },
            "response_mapping": {
              "items_path": "data.columns",
              "value_path": "letter",
              "label_path": "header",
              "samples_path": "samples"
            }
          } }
      ]
    },
    {
      "step_index": 1,
      "description": "Send the mail",
      "questions": [
        { "id": "max_rows", "question": "How many rows?", "type": "number", "default": 10,
          "validation": [{ "type": "max", "value": 500, "message": "At most 500 rows" }] },
        { "id": "dry_run", "question": "Dry run first?", "type": "boolean" }
      ]
    }
  ]
}"#;

#[tokio::test]
async fn test_fill_enrich_and_submit() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let steps_path = temp_dir.path().join("steps.json");
    fs::write(&steps_path, STEPS)?;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/tools/gsuite/sheets/inspect"))
        .and(body_json(json!({ "spreadsheet_id": "1BxiMVs0", "user_id": "user-5", "sample_rows": 3 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "columns": [
                { "letter": "A", "header": "Name", "samples": ["Ada", "Grace"] },
                { "letter": "B", "header": "Email", "samples": ["ada@example.com", 42] }
            ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpEnrichmentClient::new(server.uri(), Duration::from_secs(5))?;
    let mut session = FormSession::new(load_steps(&steps_path)?, "user-5");

    let column = session.field("email_column").cloned().unwrap();
    assert!(session.is_disabled(&column));

    session.set_value("spreadsheet_id", json!("1BxiMVs0"))?;
    assert!(!session.is_disabled(&column));

    let outcome = load_options(&mut session, "email_column", &client, None).await?;
    assert_eq!(outcome, EnrichmentOutcome::Applied { options: 2 });
    assert_eq!(session.status("email_column"), FieldStatus::Loaded);

    let options = session.options_for(&column).to_vec();
    assert_eq!(options[1].label, "Email");
    assert_eq!(
        options[1].samples.as_deref(),
        Some(&["ada@example.com".to_string(), "42".to_string()][..])
    );

    session.set_value("email_column", options[1].value.clone())?;
    session.set_value("max_rows", json!(900))?;

    let mut submitted = Vec::new();
    let report = session.submit(|values| submitted.push(values)).unwrap_err();
    assert_eq!(report.error_for("max_rows"), Some("At most 500 rows"));
    assert_eq!(session.error("max_rows"), Some("At most 500 rows"));
    assert!(submitted.is_empty());

    session.set_value("max_rows", json!(250))?;
    session.submit(|values| submitted.push(values)).unwrap();

    assert_eq!(submitted.len(), 1);
    let answers = &submitted[0];
    assert_eq!(answers["spreadsheet_id"], json!("1BxiMVs0"));
    assert_eq!(answers["email_column"], json!("B"));
    assert_eq!(answers["max_rows"], json!(250));
    assert!(!answers.contains_key("dry_run"));
    Ok(())
}

#[tokio::test]
async fn test_failed_enrichment_can_be_retried() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let steps_path = temp_dir.path().join("steps.json");
    fs::write(&steps_path, STEPS)?;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("sheet api quota"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "columns": [{ "letter": "C", "header": "Phone" }] }
        })))
        .mount(&server)
        .await;

    let client = HttpEnrichmentClient::new(server.uri(), Duration::from_secs(5))?;
    let mut session = FormSession::new(load_steps(&steps_path)?, "user-5");
    session.set_value("spreadsheet_id", json!("1BxiMVs0"))?;

    let first = load_options(&mut session, "email_column", &client, None).await?;
    assert_eq!(first, EnrichmentOutcome::Failed);
    assert_eq!(session.error("email_column"), Some("HTTP 500: sheet api quota"));
    assert!(!session.is_loading("email_column"));

    let second = load_options(&mut session, "email_column", &client, None).await?;
    assert_eq!(second, EnrichmentOutcome::Applied { options: 1 });
    assert_eq!(session.error("email_column"), None);
    Ok(())
}
