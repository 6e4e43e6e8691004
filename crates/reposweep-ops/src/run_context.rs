//! Shared, read-only state handed to every unit of pipeline work.

use std::path::{Path, PathBuf};

use reposweep_core::ExternalCommand;
use tokio_util::sync::CancellationToken;

/// Everything a clone unit or execution worker needs to know about the run.
///
/// Built once before the pipeline starts and shared behind an `Arc`; there is
/// no way to mutate it afterwards.
#[derive(Debug, Clone)]
pub struct RunContext {
    cancel: CancellationToken,
    access_token: Option<String>,
    command: ExternalCommand,
    base_dir: PathBuf,
    clone_concurrency: Option<usize>,
    exec_workers: usize,
}

impl RunContext {
    /// Create a context that runs `command` in clones placed under `base_dir`.
    ///
    /// Defaults: fresh cancellation token, anonymous cloning, unbounded clone
    /// fan-out, a single execution worker.
    pub fn new(command: ExternalCommand, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            access_token: None,
            command,
            base_dir: base_dir.into(),
            clone_concurrency: None,
            exec_workers: 1,
        }
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Authenticate clones with this token. Empty tokens are ignored.
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Cap the number of clones running at once (`None` = one per repository).
    pub fn with_clone_concurrency(mut self, limit: Option<usize>) -> Self {
        self.clone_concurrency = limit.map(|n| n.max(1));
        self
    }

    /// Number of execution workers reading from the clone stage.
    pub fn with_exec_workers(mut self, workers: usize) -> Self {
        self.exec_workers = workers.max(1);
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn command(&self) -> &ExternalCommand {
        &self.command
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn clone_concurrency(&self) -> Option<usize> {
        self.clone_concurrency
    }

    pub fn exec_workers(&self) -> usize {
        self.exec_workers
    }
}
