//! GitHub search client producing repository descriptors.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use octocrab::models::Repository;
use octocrab::Octocrab;
use reposweep_core::RepositoryDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{OpsError, OpsResult};

/// Results requested per API page (GitHub's maximum).
const PAGE_SIZE: u8 = 100;

/// GitHub stops serving search results past this many hits.
pub const SEARCH_RESULT_CAP: usize = 1000;

/// Which GitHub search endpoint to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    /// `/search/repositories`: the query matches repository metadata.
    #[default]
    Repositories,
    /// `/search/code`: the query matches file contents; hits map to their
    /// owning repository.
    Code,
}

impl FromStr for SearchKind {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "repositories" | "repository" | "repo" | "repos" => Ok(SearchKind::Repositories),
            "code" => Ok(SearchKind::Code),
            other => Err(OpsError::Config(format!(
                "Invalid search type: {other} (expected \"repositories\" or \"code\")"
            ))),
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchKind::Repositories => f.write_str("repositories"),
            SearchKind::Code => f.write_str("code"),
        }
    }
}

/// Thin wrapper over an `Octocrab` client for search queries.
#[derive(Debug, Clone)]
pub struct SearchClient {
    octocrab: Octocrab,
}

impl SearchClient {
    /// Build a client, authenticated when a token is given.
    pub fn new(access_token: Option<&str>) -> OpsResult<Self> {
        let octocrab = match access_token.filter(|t| !t.is_empty()) {
            Some(token) => Octocrab::builder().personal_token(token.to_string()).build(),
            None => Octocrab::builder().build(),
        }
        .map_err(|e| OpsError::github("client", e))?;

        Ok(Self { octocrab })
    }

    /// Run `query` against the chosen endpoint and return up to `max_results`
    /// distinct repositories.
    pub async fn search(
        &self,
        kind: SearchKind,
        query: &str,
        max_results: usize,
    ) -> OpsResult<Vec<RepositoryDescriptor>> {
        if query.trim().is_empty() {
            return Err(OpsError::Config("Search query is empty".to_string()));
        }

        let wanted = max_results.min(SEARCH_RESULT_CAP);
        if max_results > SEARCH_RESULT_CAP {
            warn!(max_results, "GitHub search is capped at {SEARCH_RESULT_CAP} results");
        }

        info!(kind = %kind, query = %query, "searching GitHub");

        let mut found = Vec::new();
        let mut page = 1u32;

        while found.len() < wanted {
            let (repos, page_len) = match kind {
                SearchKind::Repositories => {
                    let result = self
                        .octocrab
                        .search()
                        .repositories(query)
                        .per_page(PAGE_SIZE)
                        .page(page)
                        .send()
                        .await
                        .map_err(|e| OpsError::github("search/repositories", e))?;
                    let len = result.items.len();
                    (result.items, len)
                }
                SearchKind::Code => {
                    let result = self
                        .octocrab
                        .search()
                        .code(query)
                        .per_page(PAGE_SIZE)
                        .page(page)
                        .send()
                        .await
                        .map_err(|e| OpsError::github("search/code", e))?;
                    let len = result.items.len();
                    (result.items.into_iter().map(|hit| hit.repository).collect(), len)
                }
            };

            debug!(page, hits = page_len, "received search page");

            found.extend(repos.iter().map(descriptor_from_repository));
            found = dedup_by_identity(found);

            if page_len < PAGE_SIZE as usize
                || page as usize * PAGE_SIZE as usize >= SEARCH_RESULT_CAP
            {
                break;
            }
            page += 1;
        }

        found.truncate(wanted);
        info!(repositories = found.len(), "search complete");
        Ok(found)
    }
}

/// Convert an API repository into a descriptor.
pub fn descriptor_from_repository(repo: &Repository) -> RepositoryDescriptor {
    RepositoryDescriptor {
        name: repo.name.clone(),
        full_name: repo.full_name.clone(),
        clone_url: repo.clone_url.as_ref().map(|u| u.to_string()),
        html_url: repo.html_url.as_ref().map(|u| u.to_string()),
    }
}

/// Keep the first descriptor for every repository identity.
///
/// Code search reports one hit per matching file, so the same repository
/// shows up many times.
pub fn dedup_by_identity(repos: Vec<RepositoryDescriptor>) -> Vec<RepositoryDescriptor> {
    let mut seen = HashSet::new();
    repos
        .into_iter()
        .filter(|repo| seen.insert(repo.identity().to_string()))
        .collect()
}
