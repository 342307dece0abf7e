//! Process-wide configuration for the cleanup handler.
//!
//! Set once at startup, read-only afterwards. Values come from the built-in
//! defaults, then an optional JSON file, then `B1_*` environment variables.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Primary B1 host.
pub const DEFAULT_PRIMARY_BASE_URL: &str = "https://www.b1.lt";

/// Host used once the primary rejects the API key.
pub const DEFAULT_SECONDARY_BASE_URL: &str = "https://api.b1.lt";

/// Item group the marked items are moved into.
pub const DEFAULT_TARGET_GROUP_NAME: &str = "xxx_pvz grupė";

/// Rows requested per list page.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Handler configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log output format (`json` or `compact`).
    pub log_format: String,
    /// Primary B1 base URL.
    pub primary_base_url: String,
    /// Failover base URL; `None` disables failover.
    pub secondary_base_url: Option<String>,
    /// B1 API key, sent in the `B1-Api-Key` header.
    pub api_key: String,
    /// Optional tenant id, sent in the `X-Company-Id` header.
    pub company_id: Option<String>,
    /// Also copy `apiKey`/`companyId` into request bodies.
    pub api_key_in_body: bool,
    /// Target item group when the request does not override it.
    pub target_group_name: String,
    /// Dry-run flag when the request does not set one.
    pub default_dry_run: bool,
    /// Create the target group when it does not exist yet.
    pub allow_group_create: bool,
    /// Rows per page for group listing.
    pub page_size: u32,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Linear backoff unit: the n-th retry waits `n * retry_base_delay_ms`.
    pub retry_base_delay_ms: u64,
    /// Per-request HTTP timeout.
    pub timeout_secs: u64,
    /// Items processed concurrently.
    pub item_concurrency: usize,
    /// Include the audit trail in 500 responses.
    pub expose_debug_trail: bool,
    /// Audit trail capacity.
    pub debug_trail_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: "json".to_string(),
            primary_base_url: DEFAULT_PRIMARY_BASE_URL.to_string(),
            secondary_base_url: Some(DEFAULT_SECONDARY_BASE_URL.to_string()),
            api_key: String::new(),
            company_id: None,
            api_key_in_body: false,
            target_group_name: DEFAULT_TARGET_GROUP_NAME.to_string(),
            default_dry_run: false,
            allow_group_create: true,
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: 2,
            retry_base_delay_ms: 1200,
            timeout_secs: 60,
            item_concurrency: 4,
            expose_debug_trail: false,
            debug_trail_capacity: 50,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("primary_base_url", &self.primary_base_url)
            .field("secondary_base_url", &self.secondary_base_url)
            .field("api_key", &"<redacted>")
            .field("company_id", &self.company_id)
            .field("target_group_name", &self.target_group_name)
            .field("default_dry_run", &self.default_dry_run)
            .field("allow_group_create", &self.allow_group_create)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load from a JSON file (if given), apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file. Missing keys keep their defaults.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override configuration from `B1_*` environment variables.
    pub fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Blank values are ignored; unparseable numbers and booleans keep the
    /// current value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(level) = get("B1_CLEANUP_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = get("B1_CLEANUP_LOG_FORMAT") {
            self.log_format = format;
        }
        if let Some(url) = get("B1_BASE_URL") {
            self.primary_base_url = url;
        }
        if let Some(url) = get("B1_SECONDARY_BASE_URL") {
            self.secondary_base_url = match url.to_ascii_lowercase().as_str() {
                "none" | "off" => None,
                _ => Some(url),
            };
        }
        if let Some(key) = get("B1_API_KEY") {
            self.api_key = key;
        }
        if let Some(company) = get("B1_COMPANY_ID") {
            self.company_id = Some(company);
        }
        if let Some(name) = get("B1_TARGET_GROUP_NAME") {
            self.target_group_name = name;
        }
        if let Some(flag) = get("B1_DRY_RUN").and_then(|v| parse_bool(&v)) {
            self.default_dry_run = flag;
        }
        if let Some(flag) = get("B1_ALLOW_GROUP_CREATE").and_then(|v| parse_bool(&v)) {
            self.allow_group_create = flag;
        }
        if let Some(flag) = get("B1_API_KEY_IN_BODY").and_then(|v| parse_bool(&v)) {
            self.api_key_in_body = flag;
        }
        if let Some(flag) = get("B1_EXPOSE_DEBUG").and_then(|v| parse_bool(&v)) {
            self.expose_debug_trail = flag;
        }
        if let Some(size) = get("B1_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.page_size = size;
        }
        if let Some(retries) = get("B1_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            self.max_retries = retries;
        }
        if let Some(secs) = get("B1_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = secs;
        }
        if let Some(n) = get("B1_ITEM_CONCURRENCY").and_then(|v| v.parse().ok()) {
            self.item_concurrency = n;
        }
    }

    /// Reject configurations the handler cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(CoreError::Config("B1 API key is not set".to_string()));
        }
        if self.target_group_name.trim().is_empty() {
            return Err(CoreError::Config(
                "target group name must not be empty".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(CoreError::Config("page size must be positive".to_string()));
        }
        if self.item_concurrency == 0 {
            return Err(CoreError::Config(
                "item concurrency must be positive".to_string(),
            ));
        }
        self.primary_base_url()?;
        self.secondary_base_url()?;
        Ok(())
    }

    /// The primary base URL, parsed.
    pub fn primary_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.primary_base_url).map_err(CoreError::from)
    }

    /// The secondary base URL, parsed.
    pub fn secondary_base_url(&self) -> CoreResult<Option<Url>> {
        self.secondary_base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(CoreError::from)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.primary_base_url, DEFAULT_PRIMARY_BASE_URL);
        assert_eq!(
            config.secondary_base_url.as_deref(),
            Some(DEFAULT_SECONDARY_BASE_URL)
        );
        assert_eq!(config.target_group_name, DEFAULT_TARGET_GROUP_NAME);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_base_delay_ms, 1200);
        assert_eq!(config.timeout_secs, 60);
        assert!(!config.default_dry_run);
        assert!(config.allow_group_create);
    }

    #[test]
    fn test_config_load_from_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(
            &config_path,
            r#"{ "api_key": "file-key", "default_dry_run": true }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.api_key, "file-key");
        assert!(config.default_dry_run);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_overrides_apply_and_ignore_garbage() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&[
            ("B1_API_KEY", "env-key"),
            ("B1_COMPANY_ID", "42"),
            ("B1_DRY_RUN", "yes"),
            ("B1_MAX_RETRIES", "not-a-number"),
            ("B1_TARGET_GROUP_NAME", "   "),
            ("B1_SECONDARY_BASE_URL", "none"),
        ]));

        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.company_id.as_deref(), Some("42"));
        assert!(config.default_dry_run);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.target_group_name, DEFAULT_TARGET_GROUP_NAME);
        assert!(config.secondary_base_url.is_none());
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let config = Config {
            api_key: "k".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = Config {
            api_key: "k".to_string(),
            primary_base_url: "not a valid url".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: "super-secret".to_string(),
            ..Config::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
