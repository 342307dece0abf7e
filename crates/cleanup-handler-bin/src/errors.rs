use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use b1_catalog_client::{AuditEvent, CatalogError};
use cleanup_config_and_utils::CoreError;
use group_cleanup_orchestrator::WorkflowError;
use serde_json::json;
use std::fmt;
use thiserror::Error;

pub const BODY_ERROR: &str = "Body must include { items: [...] }";
pub const METHOD_ERROR: &str = "Use POST";

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Failures that keep the handler from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Error response: `{"error": message, "debug": [...]}`.
#[derive(Debug)]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
    pub debug: Option<Vec<AuditEvent>>,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            debug: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_ERROR)
    }

    /// Attach the audit trail of the failed run.
    pub fn with_debug(mut self, trail: Option<Vec<AuditEvent>>) -> Self {
        self.debug = trail;
        self
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for HandlerError {}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let body = match self.debug {
            Some(debug) => json!({ "error": self.message, "debug": debug }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<WorkflowError> for HandlerError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::SanityProbe(_) => Self::internal(err.to_string()),
            WorkflowError::TargetCategory { .. } => Self::bad_request(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_error_status() {
        let probe: HandlerError = WorkflowError::SanityProbe("no rows".to_string()).into();
        assert_eq!(probe.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(probe.message.starts_with("Auth/list sanity failed"));

        let target: HandlerError = WorkflowError::TargetCategory {
            name: "Target".to_string(),
            source: CatalogError::CategoryMissing("Target".to_string()),
        }
        .into();
        assert_eq!(target.status, StatusCode::BAD_REQUEST);
        assert!(target.message.contains("Target"));
    }
}
