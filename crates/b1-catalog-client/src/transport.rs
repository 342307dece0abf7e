//! B1 HTTP transport: POST with retries, business error detection and
//! one-time host failover.

use crate::audit::{AuditKind, AuditTrail};
use crate::error::{CatalogError, CatalogResult};
use crate::host::HostSession;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Characters of a failing body kept in [`CatalogError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Transport configuration.
#[derive(Clone)]
pub struct TransportConfig {
    /// Sent in the `B1-Api-Key` header.
    pub api_key: String,
    /// Sent in the `X-Company-Id` header when set.
    pub company_id: Option<String>,
    /// Also merge `apiKey`/`companyId` into object payloads.
    pub api_key_in_body: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Linear backoff unit.
    pub retry_base_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            company_id: None,
            api_key_in_body: false,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1200),
        }
    }
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("company_id", &self.company_id)
            .field("api_key_in_body", &self.api_key_in_body)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish_non_exhaustive()
    }
}

impl TransportConfig {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_base_delay.saturating_mul(attempt)
    }
}

/// POSTs JSON to B1 and classifies the outcome.
///
/// Cloning is cheap; clones share the HTTP connection pool and the
/// [`HostSession`].
#[derive(Clone)]
pub struct B1Transport {
    http_client: reqwest::Client,
    config: Arc<TransportConfig>,
    hosts: Arc<HostSession>,
    audit: Option<Arc<AuditTrail>>,
}

impl B1Transport {
    /// Create a transport sending to whichever host `hosts` selects.
    pub fn new(config: TransportConfig, hosts: Arc<HostSession>) -> CatalogResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config: Arc::new(config),
            hosts,
            audit: None,
        })
    }

    /// Same transport, recording every call into `trail`.
    pub fn with_audit(&self, trail: Arc<AuditTrail>) -> Self {
        Self {
            audit: Some(trail),
            ..self.clone()
        }
    }

    pub fn hosts(&self) -> &Arc<HostSession> {
        &self.hosts
    }

    /// Base URL requests currently go to.
    pub fn base_url_used(&self) -> String {
        self.hosts.active().to_string()
    }

    /// POST `payload` to `path` on the active host.
    ///
    /// Transient failures are retried up to `max_retries` times with linear
    /// backoff. A key rejection on the primary host switches the shared
    /// session to the secondary and re-issues the request without using up
    /// a retry.
    pub async fn post(&self, path: &str, payload: &Value) -> CatalogResult<Value> {
        let body = self.prepare_body(payload);
        let mut attempt: u32 = 0;

        loop {
            let host = self.hosts.active().to_string();

            match self.post_once(&host, path, &body).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    self.record(AuditKind::Error, &format!("{host}{path}"), &err.to_string());

                    if err.is_key_rejection() && self.hosts.fail_over_from(&host) {
                        continue;
                    }

                    if err.is_transient() && attempt < self.config.max_retries {
                        attempt += 1;
                        let delay = self.config.backoff_for(attempt);
                        warn!(
                            path,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "B1 request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    error!(path, attempts = attempt + 1, error = %err, "B1 request failed");
                    return Err(err);
                }
            }
        }
    }

    /// Single attempt against `host`.
    async fn post_once(&self, host: &str, path: &str, body: &Value) -> CatalogResult<Value> {
        let url = format!("{host}{path}");
        debug!(url = %url, "POST to B1");
        self.record(AuditKind::Request, &url, &body.to_string());

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .header("B1-Api-Key", &self.config.api_key);
        if let Some(company_id) = &self.config.company_id {
            request = request.header("X-Company-Id", company_id);
        }

        let response = request.body(serde_json::to_vec(body)?).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        self.record(AuditKind::Response, &url, &format!("HTTP {status} {text}"));
        classify_response(status, &text)
    }

    fn prepare_body(&self, payload: &Value) -> Value {
        let mut body = payload.clone();
        if self.config.api_key_in_body {
            if let Some(map) = body.as_object_mut() {
                map.insert("apiKey".to_string(), Value::from(self.config.api_key.clone()));
                if let Some(company_id) = &self.config.company_id {
                    map.insert("companyId".to_string(), Value::from(company_id.clone()));
                }
            }
        }
        body
    }

    fn record(&self, kind: AuditKind, url: &str, detail: &str) {
        if let Some(trail) = &self.audit {
            trail.record(kind, url, detail);
        }
    }
}

impl std::fmt::Debug for B1Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("B1Transport")
            .field("hosts", &self.hosts)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Turn an HTTP status and body into a value or a typed error.
///
/// The body is checked for a business error envelope regardless of the
/// status: B1 reports most failures as HTTP 200.
pub fn classify_response(status: u16, text: &str) -> CatalogResult<Value> {
    let success = (200..300).contains(&status);

    match serde_json::from_str::<Value>(text) {
        Ok(value) => {
            if let Some(err) = business_error(&value) {
                return Err(err);
            }
            if !success {
                return Err(CatalogError::Status {
                    status,
                    body: truncate(text),
                });
            }
            Ok(value)
        }
        Err(_) if success && text.trim().is_empty() => Ok(Value::Null),
        Err(err) if success => Err(CatalogError::Decode(format!(
            "body is not JSON ({err}): {}",
            truncate(text)
        ))),
        Err(_) => Err(CatalogError::Status {
            status,
            body: truncate(text),
        }),
    }
}

/// Extract an embedded `{code >= 400, message, errors}` envelope.
///
/// `code` alone is not enough: item records carry their own `code` field,
/// so `message` or `errors` must be present too.
pub fn business_error(body: &Value) -> Option<CatalogError> {
    let obj = body.as_object()?;
    if !obj.contains_key("message") && !obj.contains_key("errors") {
        return None;
    }
    let code = match obj.get("code")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if code < 400 {
        return None;
    }

    Some(CatalogError::Api {
        code,
        message: obj
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        errors: obj.get("errors").cloned().unwrap_or(Value::Null),
    })
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
