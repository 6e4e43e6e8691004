//! Run command implementation.
//!
//! Searches (or reads a repository list), clones every repository and runs
//! the configured command in each clone. Ctrl-C and `--timeout` stop new
//! clones from starting; work already in flight is allowed to finish. A
//! second Ctrl-C exits immediately with status 130.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reposweep_git::GitCloner;
use reposweep_ops::{
    CancellationToken, Config, OpsContext, RepositoryDescriptor, RunRequest, RunSummary,
    SearchRequest,
};
use tracing::{info, warn};

/// Options for a run, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Search query overriding the config.
    pub query: Option<String>,
    /// Command line overriding the config.
    pub command: Option<String>,
    /// JSON file with repositories to process instead of searching.
    pub repos_file: Option<PathBuf>,
    /// Cancel the run after this many seconds.
    pub timeout: Option<u64>,
    /// Maximum clones in flight.
    pub clone_concurrency: Option<usize>,
    /// Execution workers.
    pub workers: Option<usize>,
    /// Show clone transfer progress.
    pub progress: bool,
}

/// Execute a run and print its summary.
pub async fn execute(config: Config, options: RunOptions) -> Result<RunSummary> {
    let cancel = CancellationToken::new();
    let watchers = spawn_cancel_watchers(&cancel, options.timeout);

    let mut request = RunRequest::new().with_cancel(cancel);
    if let Some(query) = options.query {
        request = request.with_search(SearchRequest::new().with_query(query));
    }
    if let Some(path) = &options.repos_file {
        request = request.with_repositories(read_repositories(path)?);
    }
    if let Some(command) = options.command {
        request = request.with_command(command);
    }
    if let Some(limit) = options.clone_concurrency {
        request = request.with_clone_concurrency(limit);
    }
    if let Some(workers) = options.workers {
        request = request.with_exec_workers(workers);
    }

    let cloner = if options.progress {
        GitCloner::new().with_progress()
    } else {
        GitCloner::new()
    };
    let ops = OpsContext::with_cloner(config, Arc::new(cloner));

    let result = ops.run(request).await;
    for watcher in watchers {
        watcher.abort();
    }
    let summary = result?;

    // Summary goes to stderr; stdout belongs to the external command.
    eprintln!();
    eprintln!(
        "✅ Ran against {} of {} repositories ({} omitted){}",
        summary.processed(),
        summary.discovered,
        summary.omitted(),
        if summary.cancelled { " [cancelled]" } else { "" }
    );
    for project in &summary.projects {
        eprintln!("   • {}", project);
    }

    Ok(summary)
}

/// Read a JSON array of repository descriptors.
pub fn read_repositories(path: &Path) -> Result<Vec<RepositoryDescriptor>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read repository list {}", path.display()))?;
    let repos: Vec<RepositoryDescriptor> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse repository list {}", path.display()))?;
    info!(count = repos.len(), file = %path.display(), "loaded repository list");
    Ok(repos)
}

/// Cancel `token` on the first interrupt, then wait for another one.
///
/// Returns `true` when a second interrupt arrives. Work already in flight
/// keeps running after the first, so the caller exits the process on the
/// second.
async fn watch_interrupts<S, F>(token: CancellationToken, mut interrupt: S) -> bool
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        return false;
    }
    warn!("interrupt received; no new clones will start (Ctrl+C again to abort)");
    token.cancel();

    match interrupt().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl+C");
            false
        }
    }
}

/// Cancel the token on Ctrl-C or once the timeout elapses.
fn spawn_cancel_watchers(
    cancel: &CancellationToken,
    timeout: Option<u64>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let mut watchers = Vec::new();

    let token = cancel.clone();
    watchers.push(tokio::spawn(async move {
        if watch_interrupts(token, tokio::signal::ctrl_c).await {
            warn!("second interrupt received; aborting");
            std::process::exit(130);
        }
    }));

    if let Some(secs) = timeout {
        let token = cancel.clone();
        watchers.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(timeout_secs = secs, "timeout reached; no new clones will start");
            token.cancel();
        }));
    }

    watchers
}
