//! Input records and per-run settings.

use b1_catalog_client::{CreationPolicy, RemoteId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Display-name prefix marking items for cleanup.
pub const DEFAULT_MARKER_PREFIX: &str = "xxx";

/// One row of the exported item list sent by the caller.
///
/// Column names follow the Lithuanian export. Unknown columns are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ItemRecord {
    #[serde(rename = "ID", default)]
    pub id: Option<RemoteId>,
    #[serde(rename = "Pavadinimas", default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(rename = "Grupė", default, deserialize_with = "lenient_text")]
    pub group: Option<String>,
}

impl ItemRecord {
    /// Whether the trimmed, lower-cased display name starts with `prefix`.
    pub fn is_candidate(&self, prefix: &str) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.trim().to_lowercase().starts_with(&prefix.to_lowercase()))
    }
}

/// Settings for one run, derived from the request and process config.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_group_name: String,
    pub dry_run: bool,
    pub marker_prefix: String,
    pub creation_policy: CreationPolicy,
    pub item_concurrency: usize,
}

impl RunConfig {
    pub fn new(target_group_name: impl Into<String>, dry_run: bool) -> Self {
        Self {
            target_group_name: target_group_name.into(),
            dry_run,
            ..Self::default()
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_group_name: String::new(),
            dry_run: false,
            marker_prefix: DEFAULT_MARKER_PREFIX.to_string(),
            creation_policy: CreationPolicy::CreateIfMissing,
            item_concurrency: 4,
        }
    }
}

/// Accept strings, numbers or null for free-text columns.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_export_columns() {
        let record: ItemRecord = serde_json::from_value(json!({
            "ID": 1, "Pavadinimas": "xxx Widget", "Grupė": "Misc", "Kaina": 3.5
        }))
        .unwrap();
        assert_eq!(record.id, Some(RemoteId::Number(1)));
        assert_eq!(record.name.as_deref(), Some("xxx Widget"));
        assert_eq!(record.group.as_deref(), Some("Misc"));
    }

    #[test]
    fn test_numeric_name_and_missing_group() {
        let record: ItemRecord =
            serde_json::from_value(json!({"ID": "A1", "Pavadinimas": 123})).unwrap();
        assert_eq!(record.name.as_deref(), Some("123"));
        assert!(record.group.is_none());
    }

    #[test]
    fn test_candidate_prefix() {
        let named = |name: &str| ItemRecord {
            name: Some(name.to_string()),
            ..Default::default()
        };
        assert!(named("xxx Widget").is_candidate("xxx"));
        assert!(named("  XXX_widget").is_candidate("xxx"));
        assert!(!named("Widget xxx").is_candidate("xxx"));
        assert!(!named("xx Widget").is_candidate("xxx"));
        assert!(!ItemRecord::default().is_candidate("xxx"));
    }
}
