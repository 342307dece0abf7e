//! Error types for B1 catalog operations.
//!
//! Separates transport failures (retried), HTTP status failures and business
//! errors that B1 embeds in an otherwise successful HTTP 200 body.

use thiserror::Error;

/// HTTP statuses treated as transient and retried with backoff.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Case-insensitive terms that mark a business error as an API key rejection.
pub const KEY_REJECTION_TERMS: [&str; 4] = ["raktas", "api key", "neteisingas", "invalid"];

/// Error type for all catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or transport-level HTTP error from reqwest.
    ///
    /// Includes connection failures and timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// B1 answered with a non-success HTTP status and no business envelope.
    #[error("B1 HTTP status {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The response body, truncated.
        body: String,
    },

    /// B1 embedded an error envelope (`code >= 400`) in the response body.
    #[error("B1 error {code}: {message} ({errors})")]
    Api {
        /// Business error code from the envelope.
        code: i64,
        /// Human readable message.
        message: String,
        /// Raw `errors` detail, `null` when absent.
        errors: serde_json::Value,
    },

    /// Response body did not have the expected shape.
    #[error("Unexpected B1 response: {0}")]
    Decode(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The item group does not exist and creating it is disabled.
    #[error("Item group '{0}' does not exist and group creation is disabled")]
    CategoryMissing(String),

    /// Client could not be constructed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Whether a retry with backoff may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.is_request()
                    || err
                        .status()
                        .is_some_and(|s| TRANSIENT_STATUSES.contains(&s.as_u16()))
            }
            Self::Status { status, .. } => TRANSIENT_STATUSES.contains(status),
            _ => false,
        }
    }

    /// Whether this is a business error saying the API key was rejected.
    pub fn is_key_rejection(&self) -> bool {
        match self {
            Self::Api {
                message, errors, ..
            } => {
                let haystack = format!("{} {}", message, errors).to_lowercase();
                KEY_REJECTION_TERMS
                    .iter()
                    .any(|term| haystack.contains(term))
            }
            _ => false,
        }
    }
}

/// Convenience Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
