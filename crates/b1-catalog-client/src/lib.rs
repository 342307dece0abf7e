//! B1 reference-book client.
//!
//! ```text
//! B1Catalog (typed operations) → B1Transport (retry, failover) → B1 HTTP API
//!                                      │
//!                               HostSession (sticky)
//! ```
//!
//! - **Business errors**: B1 reports failures as HTTP 200 with a
//!   `{code, message, errors}` body; every response body is checked.
//! - **Failover**: a key rejection on the primary host switches the shared
//!   [`HostSession`] to the secondary once, for the rest of the process.
//! - **Full-record writes**: updates merge an [`ItemPatch`] over the full
//!   [`RemoteItem`] because B1 rejects partial records.
//! - **Dry runs**: the provided [`CatalogApi`] methods short-circuit every
//!   mutation.

mod audit;
mod catalog;
mod error;
mod host;
mod transport;
mod types;

pub use audit::{AuditEvent, AuditKind, AuditTrail, MAX_DETAIL_CHARS};
pub use catalog::{
    paths, B1Catalog, CatalogApi, CategoryCache, CreationPolicy, MAX_LIST_PAGES, SEARCH_PAGE_SIZE,
};
pub use error::{CatalogError, CatalogResult, KEY_REJECTION_TERMS, TRANSIENT_STATUSES};
pub use host::HostSession;
pub use transport::{business_error, classify_response, B1Transport, TransportConfig};
pub use types::{
    normalize_name, Category, CodeField, DeleteOutcome, FilterRule, ItemPatch, ListFilters,
    ListPage, ListRequest, RemoteId, RemoteItem, UpdateOutcome,
};
