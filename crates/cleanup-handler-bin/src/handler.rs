//! `POST /api/b1-cleanup`.

use crate::app::AppState;
use crate::errors::{HandlerError, HandlerResult, BODY_ERROR};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use b1_catalog_client::{AuditTrail, B1Catalog, CreationPolicy};
use cleanup_config_and_utils::Config;
use group_cleanup_orchestrator::{CleanupSummary, GroupCleanupWorkflow, ItemRecord, RunConfig};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    pub items: Vec<ItemRecord>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub target_group_name: Option<String>,
}

impl CleanupRequest {
    fn parse(body: &[u8]) -> HandlerResult<Self> {
        let request: Self = serde_json::from_slice(body).map_err(|err| {
            debug!(error = %err, "Rejected cleanup request body");
            HandlerError::bad_request(BODY_ERROR)
        })?;
        if request.items.is_empty() {
            return Err(HandlerError::bad_request(BODY_ERROR));
        }
        Ok(request)
    }

    /// Run settings: request overrides first, then process config.
    fn run_config(&self, config: &Config) -> RunConfig {
        let target = self
            .target_group_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&config.target_group_name);
        let creation_policy = if config.allow_group_create {
            CreationPolicy::CreateIfMissing
        } else {
            CreationPolicy::RequireExisting
        };

        RunConfig {
            creation_policy,
            item_concurrency: config.item_concurrency,
            ..RunConfig::new(target, self.dry_run.unwrap_or(config.default_dry_run))
        }
    }
}

pub async fn run_cleanup(
    State(state): State<AppState>,
    body: Bytes,
) -> HandlerResult<Json<CleanupSummary>> {
    let request = CleanupRequest::parse(&body)?;
    let run = request.run_config(&state.config);
    info!(
        items = request.items.len(),
        dry_run = run.dry_run,
        target = %run.target_group_name,
        "Cleanup request received"
    );

    let trail = Arc::new(AuditTrail::new(
        state.config.debug_trail_capacity,
        Some(state.config.api_key.clone()),
    ));
    let catalog = B1Catalog::new(
        state.transport.with_audit(trail.clone()),
        state.config.page_size,
    );
    let items = request.items;

    // A panic in the run must not take the connection down with it.
    let outcome = tokio::spawn(async move {
        GroupCleanupWorkflow::new(&catalog).run(&items, &run).await
    })
    .await;

    let debug_trail = state
        .config
        .expose_debug_trail
        .then(|| trail.snapshot());

    match outcome {
        Ok(Ok(summary)) => Ok(Json(summary)),
        Ok(Err(err)) => {
            error!(error = %err, "Cleanup run failed");
            Err(HandlerError::from(err).with_debug(debug_trail))
        }
        Err(join_err) => {
            error!(error = %join_err, "Cleanup run aborted");
            Err(HandlerError::internal(format!("Cleanup run aborted: {join_err}"))
                .with_debug(debug_trail))
        }
    }
}
