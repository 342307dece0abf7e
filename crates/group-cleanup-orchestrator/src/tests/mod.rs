//! Workflow tests against an in-memory catalog.
//!
//! - `harness.rs`  - `FakeCatalog` and input helpers
//! - `dry_run.rs`  - nothing is written during a dry run
//! - `moves.rs`    - moving items, fallback by name, idempotence
//! - `codes.rs`    - clearing product codes
//! - `pruning.rs`  - deleting emptied item groups
//! - `failures.rs` - fatal and per-item failures

mod dry_run;
pub(crate) mod harness;
