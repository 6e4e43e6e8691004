//! reposweep Operations Layer
//!
//! This crate runs one command across many GitHub repositories: it searches
//! for repositories, clones them concurrently and runs an external command in
//! every clone.
//!
//! ## Architecture
//!
//! The pipeline is three stages connected by synchronous handoff channels:
//! - **Search**: [`SearchClient`] turns a query into repository descriptors
//! - **Clone stage**: [`clone_all`] fans out one clone per descriptor
//! - **Execution stage**: [`execute_all`] runs the command in each clone and
//!   forwards the project
//!
//! A shared [`RunContext`] carries the command, credentials and the
//! cancellation token. [`OpsContext`] wires everything together.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reposweep_ops::{Config, OpsContext, RunRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), reposweep_ops::OpsError> {
//!     let config = Config::load(None)?;
//!     let ctx = OpsContext::new(config);
//!
//!     let summary = ctx.run(RunRequest::new()).await?;
//!
//!     println!("Ran against {} repositories", summary.processed());
//!     Ok(())
//! }
//! ```

mod clone;
mod config;
mod context;
mod error;
mod exec;
pub mod handoff;
mod requests;
mod responses;
mod run_context;
mod search;

// Re-export public API
pub use clone::clone_all;
pub use config::Config;
pub use context::OpsContext;
pub use error::{OpsError, OpsResult};
pub use exec::{execute_all, run_command};
pub use handoff::{HandoffReceiver, HandoffSender};
pub use requests::{RunRequest, SearchRequest};
pub use responses::{RunSummary, SearchResponse};
pub use run_context::RunContext;
pub use search::{dedup_by_identity, descriptor_from_repository, SearchClient, SearchKind};

pub use reposweep_core::{
    ExternalCommand, InvalidRepositoryName, Project, RepositoryDescriptor,
};
pub use tokio_util::sync::CancellationToken;
