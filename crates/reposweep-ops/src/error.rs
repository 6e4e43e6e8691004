//! Error types for the operations layer.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type for operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Errors that can occur during operations.
#[derive(Debug, Error)]
pub enum OpsError {
    /// Failed to clone a repository.
    #[error("Failed to clone repository {repo}: {message}")]
    CloneFailed { repo: String, message: String },

    /// Descriptor carries neither a clone URL nor a web URL.
    #[error("Repository {repo} has no clone URL")]
    MissingCloneUrl { repo: String },

    /// The repository name would place the clone outside the result directory.
    #[error("Invalid repository name for {repo}: {name:?}")]
    InvalidRepositoryName { repo: String, name: String },

    /// The project directory cannot be used as a working directory.
    #[error("Cannot enter project directory {path}: {message}")]
    ProjectDirectory { path: PathBuf, message: String },

    /// The external command could not be started.
    #[error("Failed to spawn `{program}` for {repo}: {message}")]
    CommandSpawn {
        repo: String,
        program: String,
        message: String,
    },

    /// The external command ran but did not succeed.
    #[error("External command failed for {repo}: {status}")]
    CommandFailed { repo: String, status: ExitStatus },

    /// Failed to fetch from GitHub API.
    #[error("GitHub API error for {resource}: {message}")]
    GitHubApi { resource: String, message: String },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A spawned task panicked or was aborted.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl OpsError {
    /// Create a clone failure for the given repository.
    pub fn clone_failed(repo: impl Into<String>, message: impl ToString) -> Self {
        Self::CloneFailed {
            repo: repo.into(),
            message: message.to_string(),
        }
    }

    /// Create a GitHub API error.
    pub fn github(resource: impl Into<String>, message: impl ToString) -> Self {
        Self::GitHubApi {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

impl From<reposweep_core::EmptyCommand> for OpsError {
    fn from(err: reposweep_core::EmptyCommand) -> Self {
        OpsError::Config(err.to_string())
    }
}
