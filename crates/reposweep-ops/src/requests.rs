//! Request types for operations.
//!
//! Each request carries the parameters for one operation, on top of the
//! loaded [`Config`](crate::Config). Unset fields fall back to the config.

use reposweep_core::RepositoryDescriptor;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::search::SearchKind;

/// Request to search GitHub for repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query overriding the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Endpoint overriding the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SearchKind>,

    /// Result limit overriding the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl SearchRequest {
    /// Search using the configured query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Search for `query` instead of the configured query.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Use the given endpoint.
    pub fn with_kind(mut self, kind: SearchKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Stop after `max` repositories.
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

/// Request to run the full search → clone → execute pipeline.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Search parameters, used unless `repositories` is given.
    pub search: SearchRequest,

    /// Repositories to process instead of searching.
    pub repositories: Option<Vec<RepositoryDescriptor>>,

    /// Command line overriding the configured external command.
    pub command: Option<String>,

    /// Clone concurrency overriding the configured one.
    pub clone_concurrency: Option<usize>,

    /// Execution worker count overriding the configured one.
    pub exec_workers: Option<usize>,

    /// Token the caller cancels to stop launching new work.
    pub cancel: CancellationToken,
}

impl RunRequest {
    /// Run with the configured search and command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process these repositories instead of searching.
    pub fn with_repositories(mut self, repos: Vec<RepositoryDescriptor>) -> Self {
        self.repositories = Some(repos);
        self
    }

    /// Use a different search.
    pub fn with_search(mut self, search: SearchRequest) -> Self {
        self.search = search;
        self
    }

    /// Run `command` in every clone.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Limit clones in flight.
    pub fn with_clone_concurrency(mut self, limit: usize) -> Self {
        self.clone_concurrency = Some(limit);
        self
    }

    /// Use `workers` execution workers.
    pub fn with_exec_workers(mut self, workers: usize) -> Self {
        self.exec_workers = Some(workers);
        self
    }

    /// Stop the run through `cancel`.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
