//! Core domain types shared across the entire reposweep workspace.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

// =============================================================================
// Repository Descriptors
// =============================================================================

/// Identifies a discovered repository and where it can be cloned from.
///
/// Produced once per search hit. A descriptor with no usable clone URL can
/// still be cloned if it carries the repository's web URL, see
/// [`RepositoryDescriptor::clone_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Short repository name, also used as the clone directory name.
    pub name: String,

    /// `owner/name`, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Git clone URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,

    /// Browser URL of the repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
}

impl RepositoryDescriptor {
    /// Create a descriptor from a name and a clone URL.
    pub fn new(name: impl Into<String>, clone_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: None,
            clone_url: Some(clone_url.into()),
            html_url: None,
        }
    }

    /// Create a descriptor that only knows the repository's web URL.
    pub fn from_html_url(name: impl Into<String>, html_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            full_name: None,
            clone_url: None,
            html_url: Some(html_url.into()),
        }
    }

    /// Attach the `owner/name` form of the repository name.
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// Attach the web URL.
    pub fn with_html_url(mut self, html_url: impl Into<String>) -> Self {
        self.html_url = Some(html_url.into());
        self
    }

    /// URL to clone from.
    ///
    /// Falls back to `<html_url>.git` when the clone URL is missing or empty.
    /// Returns `None` when neither URL is available.
    pub fn clone_url(&self) -> Option<String> {
        match self.clone_url.as_deref() {
            Some(url) if !url.is_empty() => Some(url.to_string()),
            _ => self
                .html_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .map(|url| format!("{}.git", url.trim_end_matches('/'))),
        }
    }

    /// Name used to tell repositories apart in logs and deduplication.
    pub fn identity(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.name)
    }

    /// Directory this repository is cloned into under `base_dir`.
    ///
    /// The name must be a single plain path component, so the clone always
    /// lands directly inside `base_dir`.
    pub fn target_dir(&self, base_dir: &Path) -> Result<PathBuf, InvalidRepositoryName> {
        let mut components = Path::new(&self.name).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single || self.name.chars().any(std::path::is_separator) {
            return Err(InvalidRepositoryName {
                name: self.name.clone(),
            });
        }
        Ok(base_dir.join(&self.name))
    }
}

impl fmt::Display for RepositoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.clone_url() {
            Some(url) => write!(f, "{} ({})", self.identity(), url),
            None => write!(f, "{}", self.identity()),
        }
    }
}

/// Error returned when a repository name cannot be used as a directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRepositoryName {
    /// The offending name.
    pub name: String,
}

impl fmt::Display for InvalidRepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "repository name {:?} is not a single directory name",
            self.name
        )
    }
}

impl std::error::Error for InvalidRepositoryName {}

// =============================================================================
// Projects
// =============================================================================

/// A successfully cloned repository, ready for command execution.
///
/// Projects are transient messages: created by the clone stage, forwarded
/// unchanged by the execution stage, and never collected by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    /// Repository name.
    pub name: String,
    /// Local directory holding the clone.
    pub directory: PathBuf,
}

impl Project {
    /// Create a new project record.
    pub fn new(name: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            directory: directory.into(),
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.name, self.directory.display())
    }
}

// =============================================================================
// External Commands
// =============================================================================

/// Error returned when building a command from zero tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyCommand;

impl fmt::Display for EmptyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("external command must contain at least a program name")
    }
}

impl std::error::Error for EmptyCommand {}

/// The command run inside every cloned repository.
///
/// Always holds at least one token: the first is the program, the rest are
/// its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ExternalCommand {
    tokens: Vec<String>,
}

impl ExternalCommand {
    /// Build a command from an ordered token sequence.
    pub fn new<I, S>(tokens: I) -> Result<Self, EmptyCommand>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        if tokens.is_empty() || tokens[0].is_empty() {
            return Err(EmptyCommand);
        }
        Ok(Self { tokens })
    }

    /// Split a command line on whitespace.
    ///
    /// No shell quoting is interpreted; wrap the command in `sh -c` when
    /// quoting or pipes are needed.
    pub fn parse(line: &str) -> Result<Self, EmptyCommand> {
        Self::new(line.split_whitespace())
    }

    /// The program to invoke.
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    /// Arguments passed to the program (possibly empty).
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// All tokens, program first.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl TryFrom<Vec<String>> for ExternalCommand {
    type Error = EmptyCommand;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(tokens)
    }
}

impl From<ExternalCommand> for Vec<String> {
    fn from(command: ExternalCommand) -> Self {
        command.tokens
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}
