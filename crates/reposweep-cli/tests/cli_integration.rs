//! Integration tests for the reposweep CLI.
//!
//! Repositories are seeded locally with git2 and handed to `run --repos`, so
//! no test touches the network.
//!
//! Run with: `cargo test --package reposweep-cli --test cli_integration`

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use git2::{Repository, Signature};
use tempfile::TempDir;

/// Helper to run reposweep in a specific directory.
fn run_reposweep_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reposweep"))
        .current_dir(dir)
        .args(args)
        .env_remove("REPOSWEEP_CONFIG")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute reposweep command")
}

/// Create a git repository with one commit.
fn create_origin_repo(dir: &Path) {
    let repo = Repository::init(dir).unwrap();
    fs::write(dir.join("main.rs"), "fn main() {}\n").unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new("main.rs")).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
}

/// Write a config file pointing clones at `results`.
fn write_config(dir: &Path, results: &Path, command: &str) -> PathBuf {
    let path = dir.join("reposweep.json");
    let config = serde_json::json!({
        "query": "unused",
        "external_command": command,
        "result_dir": results,
    });
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

/// Write a repository list for `run --repos`.
fn write_repos(dir: &Path, repos: &[(&str, PathBuf)]) -> PathBuf {
    let path = dir.join("repos.json");
    let list: Vec<_> = repos
        .iter()
        .map(|(name, url)| serde_json::json!({ "name": name, "clone_url": url }))
        .collect();
    fs::write(&path, serde_json::to_string(&list).unwrap()).unwrap();
    path
}

// =============================================================================
// General
// =============================================================================

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    let output = run_reposweep_in_dir(temp.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run"));
    assert!(stdout.contains("search"));
    assert!(stdout.contains("config"));
}

// =============================================================================
// Run Command Tests
// =============================================================================

#[cfg(unix)]
#[test]
fn test_run_clones_and_runs_command_in_each_repo() {
    let temp = TempDir::new().unwrap();
    let work = temp.path();
    create_origin_repo(&work.join("origins/alpha"));
    create_origin_repo(&work.join("origins/beta"));

    let results = work.join("results");
    let config = write_config(work, &results, "touch swept");
    let repos = write_repos(
        work,
        &[
            ("alpha", work.join("origins/alpha")),
            ("beta", work.join("origins/beta")),
        ],
    );

    let output = run_reposweep_in_dir(
        work,
        &[
            "--config",
            config.to_str().unwrap(),
            "run",
            "--repos",
            repos.to_str().unwrap(),
        ],
    );

    assert!(
        output.status.success(),
        "run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    for name in ["alpha", "beta"] {
        assert!(results.join(name).join("main.rs").exists(), "{name} cloned");
        assert!(results.join(name).join("swept").exists(), "{name} processed");
    }
    assert!(!work.join("swept").exists(), "command must not run in cwd");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Ran against 2 of 2 repositories"));
}

#[cfg(unix)]
#[test]
fn test_run_skips_failed_clone_and_keeps_going() {
    let temp = TempDir::new().unwrap();
    let work = temp.path();
    create_origin_repo(&work.join("origins/present"));

    let results = work.join("results");
    let config = write_config(work, &results, "touch swept");
    let repos = write_repos(
        work,
        &[
            ("present", work.join("origins/present")),
            ("absent", work.join("origins/absent")),
        ],
    );

    let output = run_reposweep_in_dir(
        work,
        &[
            "--config",
            config.to_str().unwrap(),
            "run",
            "--repos",
            repos.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "failed clones are not fatal");
    assert!(results.join("present/swept").exists());
    assert!(!results.join("absent/swept").exists());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Ran against 1 of 2 repositories (1 omitted)"));
}

#[cfg(unix)]
#[test]
fn test_run_failing_command_is_not_fatal() {
    let temp = TempDir::new().unwrap();
    let work = temp.path();
    create_origin_repo(&work.join("origins/alpha"));

    let results = work.join("results");
    let config = write_config(work, &results, "false");
    let repos = write_repos(work, &[("alpha", work.join("origins/alpha"))]);

    let output = run_reposweep_in_dir(
        work,
        &[
            "--config",
            config.to_str().unwrap(),
            "run",
            "--repos",
            repos.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Ran against 1 of 1 repositories"));
}

#[cfg(unix)]
#[test]
fn test_run_command_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    let work = temp.path();
    create_origin_repo(&work.join("origins/alpha"));

    let results = work.join("results");
    let config = write_config(work, &results, "");
    let repos = write_repos(work, &[("alpha", work.join("origins/alpha"))]);

    let output = run_reposweep_in_dir(
        work,
        &[
            "--config",
            config.to_str().unwrap(),
            "run",
            "--repos",
            repos.to_str().unwrap(),
            "--command",
            "touch flagged",
            "--workers",
            "2",
            "--clone-concurrency",
            "1",
        ],
    );

    assert!(output.status.success());
    assert!(results.join("alpha/flagged").exists());
}

#[test]
fn test_run_without_command_fails() {
    let temp = TempDir::new().unwrap();
    let work = temp.path();
    let config = write_config(work, &work.join("results"), "");
    let repos = write_repos(work, &[]);

    let output = run_reposweep_in_dir(
        work,
        &[
            "--config",
            config.to_str().unwrap(),
            "run",
            "--repos",
            repos.to_str().unwrap(),
        ],
    );

    assert!(!output.status.success(), "an empty command is a config error");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("external_command"));
}

#[test]
fn test_run_with_missing_config_file_fails() {
    let temp = TempDir::new().unwrap();
    let output = run_reposweep_in_dir(
        temp.path(),
        &["--config", "does-not-exist.json", "run", "--repos", "x.json"],
    );
    assert!(!output.status.success());
}

// =============================================================================
// Config Command Tests
// =============================================================================

#[test]
fn test_config_path_uses_flag() {
    let temp = TempDir::new().unwrap();
    let output = run_reposweep_in_dir(temp.path(), &["--config", "custom.json", "config", "path"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "custom.json");
}

#[test]
fn test_config_path_prefers_local_file() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("reposweep.json"), "{}").unwrap();

    let output = run_reposweep_in_dir(temp.path(), &["config", "path"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "reposweep.json"
    );
}

#[test]
fn test_config_set_then_get() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let set = run_reposweep_in_dir(
        dir,
        &["--config", "cfg.json", "config", "set", "query", "language:rust"],
    );
    assert!(set.status.success());
    assert!(dir.join("cfg.json").exists());

    let get = run_reposweep_in_dir(dir, &["--config", "cfg.json", "config", "get", "query"]);
    assert!(get.status.success());
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "language:rust");
}

#[test]
fn test_config_token_is_masked() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    let set = run_reposweep_in_dir(
        dir,
        &["--config", "cfg.json", "config", "set", "token", "ghp_supersecret"],
    );
    assert!(set.status.success());

    let get = run_reposweep_in_dir(dir, &["--config", "cfg.json", "config", "get", "token"]);
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "***");

    let show = run_reposweep_in_dir(dir, &["--config", "cfg.json", "config", "show"]);
    let stdout = String::from_utf8_lossy(&show.stdout);
    assert!(show.status.success());
    assert!(!stdout.contains("ghp_supersecret"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let temp = TempDir::new().unwrap();
    let output = run_reposweep_in_dir(
        temp.path(),
        &["--config", "cfg.json", "config", "set", "bogus", "1"],
    );
    assert!(!output.status.success());
}
