//! B1 item-group cleanup.
//!
//! Given the rows of an item export, [`GroupCleanupWorkflow::run`] moves every
//! item whose name starts with the marker prefix into one target group,
//! clears its product code, and deletes the groups those items left empty.
//!
//! Writes are verified by re-reading the item, so repeating a run is safe:
//! items already in place are counted, not rewritten.

mod error;
mod normalize;
mod request;
mod summary;
mod workflow;

#[cfg(test)]
mod tests;

pub use error::{WorkflowError, WorkflowResult};
pub use normalize::{CategoryKeyNormalizer, SeparatorBaseWord};
pub use request::{ItemRecord, RunConfig, DEFAULT_MARKER_PREFIX};
pub use summary::{CleanupSummary, FailureStage, RunFailure};
pub use workflow::GroupCleanupWorkflow;
