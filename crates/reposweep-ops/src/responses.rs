//! Response types for operations.

use reposweep_core::{Project, RepositoryDescriptor};
use serde::{Deserialize, Serialize};

use crate::search::SearchKind;

/// Response from a search operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// The query that was run.
    pub query: String,

    /// The endpoint that was queried.
    pub kind: SearchKind,

    /// Distinct repositories found.
    pub repositories: Vec<RepositoryDescriptor>,
}

/// Outcome of a pipeline run.
///
/// Failures are not listed individually: a repository that failed to clone is
/// simply missing from `projects`, and command failures only show up in the
/// logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of repositories handed to the clone stage.
    pub discovered: usize,

    /// Projects that came out of the execution stage, in arrival order.
    pub projects: Vec<Project>,

    /// Whether the run was cancelled before finishing.
    pub cancelled: bool,
}

impl RunSummary {
    /// Number of projects the command ran against.
    pub fn processed(&self) -> usize {
        self.projects.len()
    }

    /// Repositories that never reached the command (failed clone or
    /// cancellation).
    pub fn omitted(&self) -> usize {
        self.discovered.saturating_sub(self.projects.len())
    }
}
