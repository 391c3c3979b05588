use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vidflow - fill, check and debug schema-driven workflow forms
#[derive(Parser, Debug, Clone)]
#[command(name = "vidflow", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, env = "VIDFLOW_CONFIG", default_value = "vidflow.toml")]
    pub config: PathBuf,

    /// Base URL of the backend that serves enrichment endpoints
    #[arg(long, global = true, env = "VIDFLOW_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Enrichment request timeout in seconds
    #[arg(long, global = true, env = "VIDFLOW_TIMEOUT")]
    pub timeout: Option<u64>,

    /// User id substituted for {{USER_ID}} in enrichment parameters
    #[arg(long, global = true, env = "VIDFLOW_USER_ID")]
    pub user_id: Option<String>,

    /// Bearer token sent with enrichment requests
    #[arg(long, global = true, env = "VIDFLOW_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "vidflow=trace")
    #[arg(long, global = true, env = "VIDFLOW_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fill a form interactively and print the submitted answers as JSON
    Fill {
        /// Steps file (JSON or YAML)
        steps: PathBuf,
    },

    /// Check a steps file for schema errors and warnings
    Check {
        /// Steps file (JSON or YAML)
        steps: PathBuf,
    },

    /// Map a saved backend response into options using a response mapping
    Map {
        /// JSON file holding the backend response
        #[arg(long)]
        response: PathBuf,

        /// JSON or YAML file holding the response mapping
        #[arg(long)]
        mapping: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["vidflow", "check", "steps.json"]);
        assert_eq!(cli.config, PathBuf::from("vidflow.toml"));
        assert!(cli.backend_url.is_none());
        assert!(cli.user_id.is_none());
        assert!(matches!(cli.command, Command::Check { ref steps } if steps == &PathBuf::from("steps.json")));
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "vidflow",
            "fill",
            "form.yaml",
            "--config",
            "custom.toml",
            "--backend-url",
            "https://api.example.com",
            "--timeout",
            "10",
            "--user-id",
            "u-7",
            "--token",
            "secret",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.backend_url, Some("https://api.example.com".to_string()));
        assert_eq!(cli.timeout, Some(10));
        assert_eq!(cli.user_id, Some("u-7".to_string()));
        assert_eq!(cli.token, Some("secret".to_string()));
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Command::Fill { .. }));
    }

    #[test]
    fn test_map_requires_both_files() {
        assert!(Cli::try_parse_from(["vidflow", "map", "--response", "r.json"]).is_err());

        let cli = Cli::parse_from(["vidflow", "map", "--response", "r.json", "--mapping", "m.yaml"]);
        match cli.command {
            Command::Map { response, mapping } => {
                assert_eq!(response, PathBuf::from("r.json"));
                assert_eq!(mapping, PathBuf::from("m.yaml"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["vidflow"]).is_err());
    }
}
