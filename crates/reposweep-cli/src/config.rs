//! CLI configuration management.
//!
//! Decides which config file a command reads and writes:
//! 1. `--config <PATH>` / `REPOSWEEP_CONFIG` (must exist when loading)
//! 2. `reposweep.json` in the current directory, if present
//! 3. the per-user config file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reposweep_ops::Config;

/// Config file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "reposweep.json";

/// Resolve the config file path without touching its contents.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    Config::config_file_path()
}

/// Load configuration for commands that need it.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config_path(None).filter(|p| p.exists()),
    };

    Config::load(path.as_deref()).with_context(|| match &path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default config".to_string(),
    })
}

/// Load configuration for editing; a missing file yields defaults.
pub fn load_for_edit(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::from_file(path).with_context(|| format!("Failed to parse {}", path.display()))
    } else {
        Ok(Config::default())
    }
}
