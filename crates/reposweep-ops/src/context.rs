//! OpsContext - The main service for executing operations.
//!
//! The OpsContext holds configuration and the clone backend, and wires the
//! search client, clone stage and execution stage together.

use std::sync::Arc;

use reposweep_git::{GitCloner, RepoCloner};
use tracing::{info, warn};

use crate::clone::clone_all;
use crate::config::Config;
use crate::error::OpsResult;
use crate::exec::execute_all;
use crate::requests::{RunRequest, SearchRequest};
use crate::responses::{RunSummary, SearchResponse};
use crate::search::SearchClient;

/// The main operations context.
///
/// Cheap to clone and can be shared across async tasks.
#[derive(Clone)]
pub struct OpsContext {
    /// Configuration for operations.
    pub config: Config,

    cloner: Arc<dyn RepoCloner>,
}

impl std::fmt::Debug for OpsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpsContext {
    /// Create a new OpsContext that clones with libgit2.
    pub fn new(config: Config) -> Self {
        Self::with_cloner(config, Arc::new(GitCloner::new()))
    }

    /// Create a new OpsContext with a custom clone backend.
    pub fn with_cloner(config: Config, cloner: Arc<dyn RepoCloner>) -> Self {
        Self { config, cloner }
    }

    /// Create a new OpsContext from the default configuration sources.
    pub fn default_config() -> OpsResult<Self> {
        Ok(Self::new(Config::load(None)?))
    }

    // =========================================================================
    // Search Operations
    // =========================================================================

    /// Search GitHub for repositories.
    pub async fn search(&self, request: SearchRequest) -> OpsResult<SearchResponse> {
        let query = request.query.unwrap_or_else(|| self.config.query.clone());
        let kind = request.kind.unwrap_or(self.config.search_type);
        let max_results = request.max_results.unwrap_or(self.config.max_results);

        let client = SearchClient::new(self.config.token())?;
        let repositories = client.search(kind, &query, max_results).await?;

        Ok(SearchResponse {
            query,
            kind,
            repositories,
        })
    }

    // =========================================================================
    // Run Operations
    // =========================================================================

    /// Search (unless repositories are given), clone every hit and run the
    /// external command in each clone.
    ///
    /// Per-repository failures are logged and never abort the run. The
    /// returned summary lists the projects the command was run against.
    pub async fn run(&self, request: RunRequest) -> OpsResult<RunSummary> {
        let mut config = self.config.clone();
        if let Some(command) = request.command.clone() {
            config.external_command = command;
        }
        if let Some(limit) = request.clone_concurrency {
            config.clone_concurrency = Some(limit);
        }
        if let Some(workers) = request.exec_workers {
            config.exec_workers = workers;
        }

        // Validate the command before doing any network work.
        let ctx = Arc::new(config.run_context(request.cancel.clone())?);

        let repositories = match request.repositories {
            Some(repos) => repos,
            None => {
                let ops = OpsContext::with_cloner(config.clone(), self.cloner.clone());
                ops.search(request.search).await?.repositories
            }
        };
        let discovered = repositories.len();

        tokio::fs::create_dir_all(ctx.base_dir()).await?;
        info!(
            repositories = discovered,
            dir = %ctx.base_dir().display(),
            command = %ctx.command(),
            "starting run"
        );

        let cloned = clone_all(ctx.clone(), self.cloner.clone(), repositories);
        let mut executed = execute_all(ctx.clone(), cloned);

        let mut projects = Vec::new();
        while let Some(project) = executed.recv().await {
            info!(repo = %project.name, "finished project");
            projects.push(project);
        }

        let cancelled = ctx.is_cancelled();
        if cancelled {
            warn!(processed = projects.len(), "run cancelled");
        }

        Ok(RunSummary {
            discovered,
            projects,
            cancelled,
        })
    }
}
