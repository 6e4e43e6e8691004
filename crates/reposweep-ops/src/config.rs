//! Configuration for reposweep runs.
//!
//! Loaded from a JSON file with environment overrides: `GITHUB_TOKEN` takes
//! precedence over the file's `access_token`, and a `.env` file in the
//! current directory is honoured.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use reposweep_core::ExternalCommand;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{OpsError, OpsResult};
use crate::run_context::RunContext;
use crate::search::SearchKind;

/// Configuration for reposweep operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// GitHub personal access token, used for the API and for cloning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Which search endpoint to use.
    #[serde(default)]
    pub search_type: SearchKind,

    /// GitHub search query.
    #[serde(default)]
    pub query: String,

    /// Command run inside every clone, split on whitespace.
    #[serde(default)]
    pub external_command: String,

    /// Directory clones are placed under.
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// Maximum number of clones in flight (unbounded when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_concurrency: Option<usize>,

    /// Number of workers running the external command.
    #[serde(default = "default_exec_workers")]
    pub exec_workers: usize,

    /// Maximum number of repositories taken from the search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_result_dir() -> PathBuf {
    ProjectDirs::from("dev", "reposweep", "reposweep")
        .map(|dirs| dirs.cache_dir().join("results"))
        .unwrap_or_else(|| std::env::temp_dir().join("reposweep"))
}

fn default_exec_workers() -> usize {
    1
}

fn default_max_results() -> usize {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: None,
            search_type: SearchKind::default(),
            query: String::new(),
            external_command: String::new(),
            result_dir: default_result_dir(),
            clone_concurrency: None,
            exec_workers: default_exec_workers(),
            max_results: default_max_results(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Reads `path` when given (it must exist), otherwise the per-user config
    /// file if present, otherwise defaults. Environment overrides apply last.
    pub fn load(path: Option<&Path>) -> OpsResult<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::config_file_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        Ok(config.with_env_overrides())
    }

    /// Parse a config file without applying any overrides.
    pub fn from_file(path: &Path) -> OpsResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            OpsError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(contents: &str) -> OpsResult<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            access_token: std::env::var("GITHUB_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .or(self.access_token),
            ..self
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> OpsResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the path to the per-user configuration file.
    pub fn config_file_path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "reposweep", "reposweep")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// The access token, ignoring empty strings.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Parse the external command.
    pub fn command(&self) -> OpsResult<ExternalCommand> {
        ExternalCommand::parse(&self.external_command).map_err(|_| {
            OpsError::Config("external_command is empty; nothing to run".to_string())
        })
    }

    /// Build the shared run context for a pipeline run.
    pub fn run_context(&self, cancel: CancellationToken) -> OpsResult<RunContext> {
        Ok(RunContext::new(self.command()?, &self.result_dir)
            .with_cancel(cancel)
            .with_access_token(self.access_token.clone())
            .with_clone_concurrency(self.clone_concurrency)
            .with_exec_workers(self.exec_workers))
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "access_token" => self.access_token.as_ref().map(|_| "***".to_string()),
            "search_type" => Some(self.search_type.to_string()),
            "query" => Some(self.query.clone()),
            "external_command" => Some(self.external_command.clone()),
            "result_dir" => Some(self.result_dir.display().to_string()),
            "clone_concurrency" => Some(
                self.clone_concurrency
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "unbounded".to_string()),
            ),
            "exec_workers" => Some(self.exec_workers.to_string()),
            "max_results" => Some(self.max_results.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) -> OpsResult<()> {
        match key {
            "access_token" => {
                self.access_token = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            "search_type" => {
                self.search_type = value.parse()?;
            }
            "query" => {
                self.query = value.to_string();
            }
            "external_command" => {
                self.external_command = value.to_string();
            }
            "result_dir" => {
                self.result_dir = PathBuf::from(value);
            }
            "clone_concurrency" => {
                self.clone_concurrency = match value {
                    "" | "unbounded" => None,
                    n => Some(parse_count(key, n)?),
                };
            }
            "exec_workers" => {
                self.exec_workers = parse_count(key, value)?;
            }
            "max_results" => {
                self.max_results = parse_count(key, value)?;
            }
            _ => {
                return Err(OpsError::Config(format!("Unknown config key: {}", key)));
            }
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> OpsResult<usize> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(OpsError::Config(format!(
            "Invalid value for {}: {} (expected a positive number)",
            key, value
        ))),
    }
}
