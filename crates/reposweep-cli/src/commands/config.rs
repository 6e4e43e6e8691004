//! Config command implementation.
//!
//! Inspects and edits the reposweep config file.

use std::path::Path;

use anyhow::Result;
use reposweep_ops::Config;

/// Show current configuration.
pub fn show(config: &Config, path: Option<&Path>) -> Result<()> {
    println!("reposweep Configuration");
    println!("{:-<40}", "");

    println!(
        "Access Token:       {}",
        config
            .token()
            .map(|t| format!("{}...", t.chars().take(4).collect::<String>()))
            .unwrap_or_else(|| "(not set)".to_string())
    );
    println!("Search Type:        {}", config.search_type);
    println!("Query:              {}", or_unset(&config.query));
    println!("External Command:   {}", or_unset(&config.external_command));
    println!("Result Directory:   {}", config.result_dir.display());
    println!(
        "Clone Concurrency:  {}",
        config
            .clone_concurrency
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!("Exec Workers:       {}", config.exec_workers);
    println!("Max Results:        {}", config.max_results);

    if let Some(path) = path {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set a configuration value and save the file.
pub fn set(config: &mut Config, path: &Path, key: &str, value: &str) -> Result<()> {
    let key = normalize_key(key);
    config.set(&key, value)?;
    config.save(path)?;

    if key == "access_token" {
        println!("✅ Set access_token");
        println!("⚠️  Token stored in config file. For better security, use GITHUB_TOKEN env var.");
    } else {
        println!("Set {} to: {}", key, value);
    }
    Ok(())
}

/// Print a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let key = normalize_key(key);
    match config.get(&key) {
        Some(value) => println!("{}", value),
        None if key == "access_token" => println!("(not set)"),
        None => anyhow::bail!(
            "Unknown config key: {}. Valid keys: access_token, search_type, query, external_command, result_dir, clone_concurrency, exec_workers, max_results",
            key
        ),
    }
    Ok(())
}

/// Accept `kebab-case` keys and the short `token` alias.
fn normalize_key(key: &str) -> String {
    match key {
        "token" | "github-token" => "access_token".to_string(),
        "command" => "external_command".to_string(),
        other => other.replace('-', "_"),
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}
