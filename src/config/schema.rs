//! Loading question steps from disk.
//!
//! A steps file is JSON or YAML and holds either a bare list of steps or an
//! object with a `steps` list, which is how workflow drafts store them:
//!
//! ```yaml
//! steps:
//!   - step_index: 0
//!     description: Read the contact sheet
//!     fields:
//!       - id: spreadsheet_id
//!         prompt: Spreadsheet ID
//!         type: text
//!         required: true
//! ```

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::domain::{QuestionStep, ResponseMapping, StepsDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepsFormat {
    Json,
    Yaml,
}

impl StepsFormat {
    /// Pick the format from a file extension; anything that is not YAML is read as JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => StepsFormat::Yaml,
            _ => StepsFormat::Json,
        }
    }
}

fn parse_document<T: DeserializeOwned>(content: &str, format: StepsFormat) -> Result<T, anyhow::Error> {
    Ok(match format {
        StepsFormat::Json => serde_json::from_str(content).context("Invalid JSON document")?,
        StepsFormat::Yaml => serde_yaml::from_str(content).context("Invalid YAML document")?,
    })
}

/// Parse steps from text in the given format
pub fn parse_steps(content: &str, format: StepsFormat) -> Result<Vec<QuestionStep>, anyhow::Error> {
    let doc: StepsDocument = parse_document(content, format)?;
    Ok(doc.into())
}

/// Read and parse a steps file
pub fn load_steps(path: &Path) -> Result<Vec<QuestionStep>, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read steps file {}", path.display()))?;
    let steps = parse_steps(&content, StepsFormat::from_path(path))
        .with_context(|| format!("Failed to parse steps file {}", path.display()))?;
    tracing::debug!(path = %path.display(), steps = steps.len(), "Loaded question steps");
    Ok(steps)
}

/// Read a standalone response mapping (JSON or YAML)
pub fn load_mapping(path: &Path) -> Result<ResponseMapping, anyhow::Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping file {}", path.display()))?;
    parse_document(&content, StepsFormat::from_path(path))
        .with_context(|| format!("Failed to parse mapping file {}", path.display()))
}
