//! Search command implementation.
//!
//! Lists the repositories a run would process.

use anyhow::Result;
use reposweep_ops::{Config, OpsContext, SearchKind, SearchRequest};

/// Run a search and print the repositories found.
///
/// With `json`, the output is a repository list accepted by `run --repos`.
pub async fn execute(
    config: Config,
    query: Option<String>,
    kind: Option<SearchKind>,
    max_results: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut request = SearchRequest::new();
    if let Some(query) = query {
        request = request.with_query(query);
    }
    if let Some(kind) = kind {
        request = request.with_kind(kind);
    }
    if let Some(max) = max_results {
        request = request.with_max_results(max);
    }

    let ops = OpsContext::new(config);
    let response = ops.search(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response.repositories)?);
        return Ok(());
    }

    println!("Search ({}): {}", response.kind, response.query);
    println!("\nRepositories ({} found):", response.repositories.len());
    println!("{:-<60}", "");

    for (i, repo) in response.repositories.iter().enumerate() {
        println!(
            "{:3}. {:40} {}",
            i + 1,
            repo.identity(),
            repo.clone_url().unwrap_or_default()
        );
    }

    Ok(())
}
