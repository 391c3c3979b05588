use anyhow::{bail, Context};
use clap::Parser;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vidflow::adapters::{FormResult, HttpEnrichmentClient, TerminalForm};
use vidflow::cli::{Cli, Command};
use vidflow::config::validator::{SchemaValidator, Severity};
use vidflow::config::{load_mapping, load_steps, Settings};
use vidflow::engine::{try_map_response_to_options, FormSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new_with_cli(&cli)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Fill { steps } => fill(&settings, steps).await,
        Command::Check { steps } => check(steps),
        Command::Map { response, mapping } => map(response, mapping),
    }
}

async fn fill(settings: &Settings, path: &Path) -> anyhow::Result<()> {
    let steps = load_steps(path)?;
    if let Err(errors) = SchemaValidator::validate(&steps) {
        for e in &errors {
            eprintln!("error: {}", e);
        }
        bail!("{} has {} schema error(s); run `vidflow check` for details", path.display(), errors.len());
    }

    let client = HttpEnrichmentClient::from_settings(settings)?;
    let session = FormSession::new(steps, settings.user_id());
    info!(backend = %settings.backend.base_url, "Starting form");

    let stdin = io::stdin();
    let mut form = TerminalForm::new(stdin.lock(), io::stderr(), &client, settings.identity.token.clone());

    match form.run(session).await? {
        FormResult::Submitted(values) => {
            let answers: BTreeMap<String, Value> = values.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&answers)?);
        }
        FormResult::Cancelled => warn!("Form cancelled; nothing submitted"),
    }
    Ok(())
}

fn check(path: &Path) -> anyhow::Result<()> {
    let steps = load_steps(path)?;
    let issues = SchemaValidator::check(&steps);

    let mut error_count = 0;
    for issue in &issues {
        match issue.severity {
            Severity::Error => {
                error_count += 1;
                println!("error: {}", issue.error);
            }
            Severity::Warning => println!("warning: {}", issue.error),
        }
    }

    let field_count: usize = steps.iter().map(|s| s.fields.len()).sum();
    println!(
        "{}: {} step(s), {} field(s), {} error(s), {} warning(s)",
        path.display(),
        steps.len(),
        field_count,
        error_count,
        issues.len() - error_count
    );

    if error_count > 0 {
        bail!("schema check failed");
    }
    Ok(())
}

fn map(response_path: &Path, mapping_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(response_path)
        .with_context(|| format!("Failed to read response file {}", response_path.display()))?;
    let response: Value = serde_json::from_str(&content)
        .with_context(|| format!("Response file {} is not JSON", response_path.display()))?;
    let mapping = load_mapping(mapping_path)?;

    let options = try_map_response_to_options(&response, &mapping)?;
    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}
