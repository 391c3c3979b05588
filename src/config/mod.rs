use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod schema;
pub mod validator;

pub use schema::{load_mapping, load_steps, parse_steps, StepsFormat};

use crate::cli::Cli;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub identity: IdentitySettings,
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            identity: IdentitySettings::default(),
            log_level: default_log_level(),
        }
    }
}

/// Where enrichment endpoints live
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Base URL that relative endpoint paths are joined onto
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Identity threaded into `{{USER_ID}}` placeholders and the bearer header
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IdentitySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Bearer credential for backend calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Create settings from CLI arguments (includes config file and CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::load(Some(&cli.config))?;

        // CLI > env vars > config file
        settings.apply_cli_overrides(cli);

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        let config_path = Path::new(root).join("vidflow");
        let settings = Self::load(Some(&config_path))?;
        settings.validate()?;
        Ok(settings)
    }

    fn load(config_path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let mut builder = Config::builder()
            .set_default("backend.base_url", default_base_url())?
            .set_default("backend.timeout_seconds", 30)?
            .set_default("log_level", default_log_level())?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        let s = builder
            .add_source(
                Environment::with_prefix("VIDFLOW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        validator::ConfigValidator::validate(self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!(
                "Configuration validation failed:\n{}",
                error_messages.join("\n")
            )
        })
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(url) = &cli.backend_url {
            self.backend.base_url = url.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.backend.timeout_seconds = timeout;
        }
        if let Some(user_id) = &cli.user_id {
            self.identity.user_id = Some(user_id.clone());
        }
        if let Some(token) = &cli.token {
            self.identity.token = Some(token.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
    }

    /// User id for `{{USER_ID}}`, empty when none is configured
    pub fn user_id(&self) -> &str {
        self.identity.user_id.as_deref().unwrap_or_default()
    }
}
