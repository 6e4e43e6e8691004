//! Clone backends used by the clone stage.

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks};
use tracing::debug;

/// Username sent alongside an access token.
///
/// GitHub ignores it for token auth but libgit2 refuses an empty one.
pub const TOKEN_USERNAME: &str = "reposweep";

/// Abstraction describing how a repository is cloned onto disk.
///
/// Implementations are called from the blocking thread pool, one call per
/// repository, possibly many at once.
pub trait RepoCloner: Send + Sync {
    /// Clone `url` into `dest`, authenticating with `token` when present.
    fn clone_repo(&self, url: &str, dest: &Path, token: Option<&str>) -> Result<(), git2::Error>;
}

/// Default libgit2-backed cloner.
#[derive(Debug, Clone, Default)]
pub struct GitCloner {
    /// Write transfer progress to stderr.
    pub progress: bool,
}

impl GitCloner {
    /// Construct a cloner that stays quiet during transfers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report transfer progress on stderr.
    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }
}

impl RepoCloner for GitCloner {
    fn clone_repo(&self, url: &str, dest: &Path, token: Option<&str>) -> Result<(), git2::Error> {
        let mut callbacks = RemoteCallbacks::new();

        if let Some(token) = token.filter(|t| !t.is_empty()) {
            callbacks.credentials(move |_url, _username_from_url, _allowed_types| {
                Cred::userpass_plaintext(TOKEN_USERNAME, token)
            });
        }

        if self.progress {
            let label = dest.display().to_string();
            callbacks.transfer_progress(move |stats| {
                if stats.received_objects() == stats.total_objects() {
                    eprintln!(
                        "{}: received {}/{} objects",
                        label,
                        stats.received_objects(),
                        stats.total_objects()
                    );
                }
                true
            });
        }

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        debug!(url = %url, dest = %dest.display(), "cloning repository");

        RepoBuilder::new()
            .fetch_options(fetch_options)
            .clone(url, dest)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use tempfile::TempDir;

    /// Create a repository with a single commit to clone from.
    fn seed_repo(dir: &Path) {
        let repo = Repository::init(dir).unwrap();
        std::fs::write(dir.join("README.md"), "hello\n").unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new("README.md")).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("test", "test@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }

    #[test]
    fn test_clone_local_repository() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        seed_repo(&origin);

        let dest = temp.path().join("out").join("copy");
        GitCloner::new()
            .clone_repo(origin.to_str().unwrap(), &dest, None)
            .unwrap();

        assert!(dest.join(".git").exists());
        assert!(dest.join("README.md").exists());
    }

    #[test]
    fn test_clone_with_token_over_local_transport() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        seed_repo(&origin);

        // Local transport never asks for credentials; the token is simply unused.
        let dest = temp.path().join("copy");
        GitCloner::new()
            .clone_repo(origin.to_str().unwrap(), &dest, Some("secret"))
            .unwrap();
        assert!(dest.join("README.md").exists());
    }

    #[test]
    fn test_clone_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let dest = temp.path().join("copy");

        let result = GitCloner::new().clone_repo(missing.to_str().unwrap(), &dest, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_clone_into_non_empty_directory_fails() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        seed_repo(&origin);

        let dest = temp.path().join("copy");
        GitCloner::new()
            .clone_repo(origin.to_str().unwrap(), &dest, None)
            .unwrap();

        let again = GitCloner::new().clone_repo(origin.to_str().unwrap(), &dest, None);
        assert!(again.is_err());
    }
}
