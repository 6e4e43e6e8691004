//! Clone stage: fan out one clone per repository and publish the results.

use std::path::PathBuf;
use std::sync::Arc;

use reposweep_core::{Project, RepositoryDescriptor};
use reposweep_git::RepoCloner;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::error::{OpsError, OpsResult};
use crate::handoff::{self, HandoffReceiver, HandoffSender};
use crate::run_context::RunContext;

/// Clone every repository concurrently and stream back the successful ones.
///
/// One unit of work is spawned per descriptor. With
/// [`RunContext::clone_concurrency`] set, at most that many clones run at
/// once; otherwise all start together. Finished clones waiting for a consumer
/// do not count against the limit. Failed clones, including repositories
/// whose name is not a plain directory name, are logged and omitted.
///
/// The returned channel closes once every unit has finished, whether it
/// cloned, failed, or observed cancellation. Arrival order is unspecified.
///
/// Repositories sharing a name target the same directory; they are not
/// deduplicated, so every one after the first usually fails to clone.
///
/// Must be called from within a Tokio runtime.
pub fn clone_all(
    ctx: Arc<RunContext>,
    cloner: Arc<dyn RepoCloner>,
    descriptors: Vec<RepositoryDescriptor>,
) -> HandoffReceiver<Project> {
    let (tx, rx) = handoff::channel();
    let limit = ctx
        .clone_concurrency()
        .map(|permits| Arc::new(Semaphore::new(permits)));

    info!(
        repositories = descriptors.len(),
        limit = ?ctx.clone_concurrency(),
        "starting clone stage"
    );

    let mut units = JoinSet::new();
    for repo in descriptors {
        let ctx = ctx.clone();
        let cloner = cloner.clone();
        let tx = tx.clone();
        let limit = limit.clone();

        units.spawn(async move {
            clone_unit(&ctx, cloner, repo, limit, &tx).await;
        });
    }

    tokio::spawn(async move {
        while let Some(joined) = units.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "clone unit aborted");
            }
        }
        debug!("all clone units finished; closing clone output");
        // Last sender; dropping it closes the channel for consumers.
        drop(tx);
    });

    rx
}

/// A single clone attempt, from cancellation check to publication.
async fn clone_unit(
    ctx: &RunContext,
    cloner: Arc<dyn RepoCloner>,
    repo: RepositoryDescriptor,
    limit: Option<Arc<Semaphore>>,
    tx: &HandoffSender<Project>,
) {
    // The permit covers the clone only; waiting for a consumer does not hold it.
    let permit = match limit {
        Some(semaphore) => match semaphore.acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(_) => return,
        },
        None => None,
    };

    if ctx.is_cancelled() {
        debug!(repo = %repo.identity(), "run cancelled; skipping clone");
        return;
    }

    let cloned = clone_repository(ctx, cloner, &repo).await;
    drop(permit);

    let dir = match cloned {
        Ok(dir) => dir,
        Err(e) => {
            error!(repo = %repo.identity(), error = %e, "failed to clone repository");
            return;
        }
    };

    info!(repo = %repo.identity(), dir = %dir.display(), "cloned repository");

    // A clone that finished after cancellation is kept on disk but not published.
    if ctx.is_cancelled() {
        debug!(repo = %repo.identity(), "run cancelled after clone; not publishing");
        return;
    }

    let project = Project::new(repo.name.clone(), dir);
    tokio::select! {
        biased;
        _ = ctx.cancel_token().cancelled() => {
            debug!(repo = %repo.identity(), "run cancelled while waiting for a consumer");
        }
        sent = tx.send(project) => {
            if sent.is_err() {
                debug!(repo = %repo.identity(), "clone output closed; dropping project");
            }
        }
    }
}

/// Clone `repo` into `<base_dir>/<name>` on the blocking pool.
async fn clone_repository(
    ctx: &RunContext,
    cloner: Arc<dyn RepoCloner>,
    repo: &RepositoryDescriptor,
) -> OpsResult<PathBuf> {
    let url = repo.clone_url().ok_or_else(|| OpsError::MissingCloneUrl {
        repo: repo.identity().to_string(),
    })?;
    let dir = repo
        .target_dir(ctx.base_dir())
        .map_err(|e| OpsError::InvalidRepositoryName {
            repo: repo.identity().to_string(),
            name: e.name,
        })?;
    let token = ctx.access_token().map(str::to_owned);

    debug!(repo = %repo.identity(), url = %url, dir = %dir.display(), "cloning");

    let target = dir.clone();
    let name = repo.identity().to_string();
    tokio::task::spawn_blocking(move || -> OpsResult<()> {
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        cloner
            .clone_repo(&url, &target, token.as_deref())
            .map_err(|e| OpsError::clone_failed(name, e.message()))
    })
    .await??;

    Ok(dir)
}
