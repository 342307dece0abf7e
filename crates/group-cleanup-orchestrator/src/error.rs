//! Run-level failures of the cleanup workflow.
//!
//! Per-item and per-group problems never show up here; they are recorded in
//! the summary instead.

use b1_catalog_client::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The initial items listing failed or came back without `rows`.
    #[error("Auth/list sanity failed: {0}")]
    SanityProbe(String),

    /// The target group could not be found or created.
    #[error("Target item group '{name}' could not be resolved: {source}")]
    TargetCategory {
        name: String,
        #[source]
        source: CatalogError,
    },
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
