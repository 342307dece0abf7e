//! Router, shared state and server startup.

use crate::errors::{HandlerError, StartupError};
use crate::handler;
use axum::routing::{get, post};
use axum::Router;
use b1_catalog_client::{B1Transport, HostSession, TransportConfig};
use cleanup_config_and_utils::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

/// State shared by every request.
///
/// The transport (and with it the [`HostSession`]) lives for the whole
/// process, so a switch to the secondary host applies to all later runs.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub transport: B1Transport,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, StartupError> {
        let primary = config.primary_base_url()?;
        let secondary = config.secondary_base_url()?;
        let hosts = Arc::new(HostSession::new(
            primary.as_str(),
            secondary.map(|url| url.to_string()),
        ));

        let transport = B1Transport::new(
            TransportConfig {
                api_key: config.api_key.clone(),
                company_id: config.company_id.clone(),
                api_key_in_body: config.api_key_in_body,
                timeout: Duration::from_secs(config.timeout_secs),
                max_retries: config.max_retries,
                retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            },
            hosts,
        )?;

        Ok(Self {
            config: Arc::new(config),
            transport,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/b1-cleanup",
            post(handler::run_cleanup).fallback(method_not_allowed),
        )
        .route("/", post(handler::run_cleanup).fallback(method_not_allowed))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(config: Config, addr: &str) -> Result<(), StartupError> {
    let state = AppState::new(config)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!(
        addr = %addr,
        b1_host = %state.transport.base_url_used(),
        dry_run_default = state.config.default_dry_run,
        target = %state.config.target_group_name,
        "B1 cleanup handler listening"
    );

    axum::serve(listener, router(state))
        .await
        .map_err(StartupError::Serve)
}

async fn method_not_allowed() -> HandlerError {
    HandlerError::method_not_allowed()
}

async fn healthz() -> &'static str {
    "ok"
}
