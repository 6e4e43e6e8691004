//! reposweep CLI - run one command across many GitHub repositories.
//!
//! Searches GitHub, clones every hit concurrently and runs the configured
//! external command inside each clone.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reposweep_ops::SearchKind;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{config as config_cmd, run, search};

/// reposweep - clone every repository a search finds and run a command in each.
#[derive(Parser, Debug)]
#[command(
    name = "reposweep",
    author,
    version,
    about = "Search GitHub, clone the results and run a command in every clone",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the JSON config file.
    #[arg(short, long, global = true, env = "REPOSWEEP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Search, clone and run the external command in every clone.
    Run {
        /// Search query (overrides the config).
        #[arg(long)]
        query: Option<String>,

        /// Command to run in each clone (overrides the config).
        #[arg(long = "command", value_name = "CMD")]
        external_command: Option<String>,

        /// JSON file listing repositories to process instead of searching.
        #[arg(long, value_name = "FILE")]
        repos: Option<PathBuf>,

        /// Stop starting new clones after this many seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Maximum number of clones in flight (default: unbounded).
        #[arg(long, value_name = "N")]
        clone_concurrency: Option<usize>,

        /// Number of workers running the external command.
        #[arg(short, long, value_name = "N")]
        workers: Option<usize>,

        /// Print clone transfer progress.
        #[arg(long)]
        progress: bool,
    },

    /// List the repositories a search returns.
    Search {
        /// Search query (overrides the config).
        #[arg(long)]
        query: Option<String>,

        /// Use code search instead of repository search.
        #[arg(long)]
        code: bool,

        /// Maximum number of repositories to list.
        #[arg(long, value_name = "N")]
        max_results: Option<usize>,

        /// Print the repositories as JSON (usable with `run --repos`).
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration.
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,
        /// Configuration value.
        value: String,
    },

    /// Get a configuration value.
    Get {
        /// Configuration key.
        key: String,
    },

    /// Show path to config file.
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run {
            query,
            external_command,
            repos,
            timeout,
            clone_concurrency,
            workers,
            progress,
        } => {
            let config = config::load(cli.config.as_deref())?;
            let options = run::RunOptions {
                query,
                command: external_command,
                repos_file: repos,
                timeout,
                clone_concurrency,
                workers,
                progress,
            };
            run::execute(config, options).await?;
        }

        Commands::Search {
            query,
            code,
            max_results,
            json,
        } => {
            let config = config::load(cli.config.as_deref())?;
            let kind = code.then_some(SearchKind::Code);
            search::execute(config, query, kind, max_results, json).await?;
        }

        Commands::Config(config_cmd_inner) => {
            let path = config::config_path(cli.config.as_deref());
            match config_cmd_inner {
                ConfigCommands::Show => {
                    let config = config::load(cli.config.as_deref())?;
                    config_cmd::show(&config, path.as_deref())?;
                }
                ConfigCommands::Set { key, value } => {
                    let Some(path) = path else {
                        anyhow::bail!("No config file location available; pass --config <PATH>");
                    };
                    let mut config = config::load_for_edit(&path)?;
                    config_cmd::set(&mut config, &path, &key, &value)?;
                }
                ConfigCommands::Get { key } => {
                    let config = config::load(cli.config.as_deref())?;
                    config_cmd::get(&config, &key)?;
                }
                ConfigCommands::Path => {
                    if let Some(path) = path {
                        println!("{}", path.display());
                    } else {
                        println!("(no config file path available)");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Send logs to stderr so stdout stays with the external command.
///
/// `RUST_LOG` takes precedence over `--verbose` / `--quiet`.
fn init_tracing(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN // Default to less noise
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
