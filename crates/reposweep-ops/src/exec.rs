//! Execution stage: run the external command inside every cloned project.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use reposweep_core::{ExternalCommand, Project};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::{OpsError, OpsResult};
use crate::handoff::{self, HandoffReceiver};
use crate::run_context::RunContext;

/// Run the configured command for every project received on `input` and
/// forward each project downstream, whatever the command's outcome.
///
/// [`RunContext::exec_workers`] workers share the input. With a single worker
/// (the default) commands run one at a time in arrival order; with more, they
/// run in parallel and output order is unspecified. Each command gets the
/// project directory as its own working directory, so workers never interfere
/// through process-wide state.
///
/// There is no cancellation check here: every project that arrives is
/// processed to completion. The output closes once `input` is closed and
/// drained.
///
/// Must be called from within a Tokio runtime.
pub fn execute_all(
    ctx: Arc<RunContext>,
    input: HandoffReceiver<Project>,
) -> HandoffReceiver<Project> {
    let (tx, rx) = handoff::channel();
    let input = Arc::new(Mutex::new(input));

    info!(
        workers = ctx.exec_workers(),
        command = %ctx.command(),
        "starting execution stage"
    );

    for worker in 0..ctx.exec_workers() {
        let ctx = ctx.clone();
        let input = input.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            loop {
                let next = input.lock().await.recv().await;
                let Some(project) = next else {
                    break;
                };

                if let Err(e) = run_command(ctx.command(), &project).await {
                    error!(repo = %project.name, error = %e, "external command failed");
                }

                if tx.send(project).await.is_err() {
                    warn!(worker, "execution output closed; stopping worker");
                    break;
                }
            }
            debug!(worker, "execution worker finished");
        });
    }

    rx
}

/// Run `command` once with `project.directory` as its working directory.
///
/// Standard output and error are inherited so the command's own output shows
/// up directly; standard input is closed. A non-zero exit is an error.
pub async fn run_command(command: &ExternalCommand, project: &Project) -> OpsResult<ExitStatus> {
    match tokio::fs::metadata(&project.directory).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(OpsError::ProjectDirectory {
                path: project.directory.clone(),
                message: "not a directory".to_string(),
            })
        }
        Err(e) => {
            return Err(OpsError::ProjectDirectory {
                path: project.directory.clone(),
                message: e.to_string(),
            })
        }
    }

    debug!(repo = %project.name, command = %command, "running external command");

    let status = Command::new(command.program())
        .args(command.args())
        .current_dir(&project.directory)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| OpsError::CommandSpawn {
            repo: project.name.clone(),
            program: command.program().to_string(),
            message: e.to_string(),
        })?;

    if !status.success() {
        return Err(OpsError::CommandFailed {
            repo: project.name.clone(),
            status,
        });
    }

    info!(repo = %project.name, "external command succeeded");
    Ok(status)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::Path;

    use tempfile::TempDir;

    fn project_in(base: &Path, name: &str) -> Project {
        let dir = base.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        Project::new(name, dir)
    }

    fn command(tokens: &[&str]) -> ExternalCommand {
        ExternalCommand::new(tokens.iter().copied()).unwrap()
    }

    /// Feed `projects` into the execution stage and collect its output.
    async fn run_stage(ctx: RunContext, projects: Vec<Project>) -> Vec<Project> {
        let (tx, rx) = handoff::channel();
        let out = execute_all(Arc::new(ctx), rx);

        let feeder = tokio::spawn(async move {
            for project in projects {
                tx.send(project).await.unwrap();
            }
        });

        let forwarded = out.drain().await;
        feeder.await.unwrap();
        forwarded
    }

    #[tokio::test]
    async fn test_forwards_every_project_in_order() {
        let temp = TempDir::new().unwrap();
        let projects = vec![project_in(temp.path(), "a"), project_in(temp.path(), "b")];
        let ctx = RunContext::new(command(&["echo", "ok"]), temp.path());

        let forwarded = run_stage(ctx, projects.clone()).await;
        assert_eq!(forwarded, projects);
    }

    #[tokio::test]
    async fn test_failing_command_still_forwards() {
        let temp = TempDir::new().unwrap();
        let projects = vec![project_in(temp.path(), "a"), project_in(temp.path(), "b")];
        let ctx = RunContext::new(command(&["false"]), temp.path());

        let forwarded = run_stage(ctx, projects.clone()).await;
        assert_eq!(forwarded, projects);
    }

    #[tokio::test]
    async fn test_missing_program_still_forwards() {
        let temp = TempDir::new().unwrap();
        let projects = vec![project_in(temp.path(), "a")];
        let ctx = RunContext::new(command(&["reposweep-no-such-program"]), temp.path());

        let forwarded = run_stage(ctx, projects.clone()).await;
        assert_eq!(forwarded, projects);
    }

    #[tokio::test]
    async fn test_missing_directory_still_forwards() {
        let temp = TempDir::new().unwrap();
        let ghost = Project::new("ghost", temp.path().join("ghost"));
        let ctx = RunContext::new(command(&["true"]), temp.path());

        let forwarded = run_stage(ctx, vec![ghost.clone()]).await;
        assert_eq!(forwarded, vec![ghost]);
    }

    #[tokio::test]
    async fn test_command_runs_in_project_directory() {
        let temp = TempDir::new().unwrap();
        let projects = vec![project_in(temp.path(), "a"), project_in(temp.path(), "b")];
        let ctx = RunContext::new(command(&["touch", "swept"]), temp.path());

        run_stage(ctx, projects).await;

        assert!(temp.path().join("a/swept").exists());
        assert!(temp.path().join("b/swept").exists());
        assert!(!temp.path().join("swept").exists());
    }

    #[tokio::test]
    async fn test_same_project_twice_runs_twice() {
        let temp = TempDir::new().unwrap();
        let project = project_in(temp.path(), "a");
        let ctx = RunContext::new(
            command(&["sh", "-c", "echo run >> invocations"]),
            temp.path(),
        );

        let forwarded = run_stage(ctx, vec![project.clone(), project.clone()]).await;
        assert_eq!(forwarded.len(), 2);

        let log = std::fs::read_to_string(project.directory.join("invocations")).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_worker_pool_forwards_all() {
        let temp = TempDir::new().unwrap();
        let projects: Vec<Project> = (0..10)
            .map(|i| project_in(temp.path(), &format!("p{i}")))
            .collect();
        let ctx = RunContext::new(command(&["sh", "-c", "pwd > here"]), temp.path())
            .with_exec_workers(4);

        let forwarded = run_stage(ctx, projects.clone()).await;

        let expected: HashSet<_> = projects.iter().cloned().collect();
        let got: HashSet<_> = forwarded.iter().cloned().collect();
        assert_eq!(forwarded.len(), projects.len());
        assert_eq!(got, expected);

        for project in &projects {
            let here = std::fs::read_to_string(project.directory.join("here")).unwrap();
            let here = std::fs::canonicalize(here.trim()).unwrap();
            assert_eq!(here, std::fs::canonicalize(&project.directory).unwrap());
        }
    }

    #[tokio::test]
    async fn test_run_command_reports_exit_status() {
        let temp = TempDir::new().unwrap();
        let project = project_in(temp.path(), "a");

        let ok = run_command(&command(&["true"]), &project).await.unwrap();
        assert!(ok.success());

        let err = run_command(&command(&["sh", "-c", "exit 3"]), &project)
            .await
            .unwrap_err();
        match err {
            OpsError::CommandFailed { repo, status } => {
                assert_eq!(repo, "a");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("Expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_input_closes_output() {
        let temp = TempDir::new().unwrap();
        let ctx = RunContext::new(command(&["true"]), temp.path()).with_exec_workers(3);
        assert!(run_stage(ctx, vec![]).await.is_empty());
    }
}
