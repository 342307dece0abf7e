//! Typed B1 reference-book records and request bodies.

use crate::error::CatalogResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier used by B1, which may arrive as a JSON number or a string.
///
/// Two ids are equal when their textual forms are equal (`12 == "12"`).
/// Serialization keeps the original JSON type so records round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteId {
    Number(i64),
    Text(String),
}

impl RemoteId {
    /// Sentinel id of a group that was only synthesized during a dry run.
    pub const SYNTHETIC: RemoteId = RemoteId::Number(-1);

    pub fn is_synthetic(&self) -> bool {
        *self == Self::SYNTHETIC
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.clone()),
        }
    }

    fn text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl PartialEq for RemoteId {
    fn eq(&self, other: &Self) -> bool {
        self.text() == other.text()
    }
}

impl Eq for RemoteId {}

impl Hash for RemoteId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text().hash(state);
    }
}

impl From<i64> for RemoteId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RemoteId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Case-insensitive, trimmed form used to compare group names.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Fields that may hold an item's product code, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeField {
    Code,
    ItemCode,
    Sku,
}

impl CodeField {
    pub const ALL: [CodeField; 3] = [CodeField::Code, CodeField::ItemCode, CodeField::Sku];

    /// JSON key used by B1.
    pub fn key(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::ItemCode => "itemCode",
            Self::Sku => "sku",
        }
    }
}

/// Full item record as returned by B1.
///
/// B1 rejects partial updates, so every attribute not modelled here is kept
/// in `extra` and written back untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteItem {
    pub id: RemoteId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<RemoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RemoteItem {
    /// Current value of a code field.
    pub fn code_value(&self, field: CodeField) -> Option<&Value> {
        match field {
            CodeField::Code => self.code.as_ref(),
            CodeField::ItemCode => self.item_code.as_ref(),
            CodeField::Sku => self.sku.as_ref(),
        }
    }

    /// Whether a code field is absent, null or blank.
    pub fn code_is_empty(&self, field: CodeField) -> bool {
        match self.code_value(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(other) => other.to_string().trim().is_empty(),
        }
    }

    /// Whether every code field is empty.
    pub fn codes_cleared(&self) -> bool {
        CodeField::ALL.iter().all(|f| self.code_is_empty(*f))
    }

    /// Whether the item sits in `target`, by id or by name.
    pub fn is_in_group(&self, target: &Category) -> bool {
        let by_id = self
            .group_id
            .as_ref()
            .is_some_and(|id| *id == target.id);
        let by_name = self
            .group
            .as_deref()
            .is_some_and(|name| normalize_name(name) == target.normalized_name());
        by_id || by_name
    }

    /// Full record with `patch` applied on top, ready to submit.
    pub fn merged_with(&self, patch: &ItemPatch) -> CatalogResult<Value> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch.fields() {
            record.insert(key.clone(), value.clone());
        }
        Ok(Value::Object(record))
    }
}

/// Fields to change on an item. Everything else is preserved on write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    fields: Map<String, Value>,
}

impl ItemPatch {
    /// Move to a group by id.
    pub fn group_id(id: &RemoteId) -> Self {
        Self::default().set("groupId", id.to_json())
    }

    /// Move to a group by name.
    pub fn group_name(name: &str) -> Self {
        Self::default().set("group", Value::from(name))
    }

    /// Clear one code field.
    pub fn clear_code(field: CodeField) -> Self {
        Self::default().set(field.key(), Value::from(""))
    }

    pub fn set(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Item group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: RemoteId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Category {
    pub fn new(id: RemoteId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// Placeholder returned by dry runs for a group that does not exist yet.
    pub fn synthetic(name: impl Into<String>) -> Self {
        Self::new(RemoteId::SYNTHETIC, name)
    }

    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Rule inside a list filter.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FilterRule {
    pub field: String,
    pub op: String,
    pub data: Value,
}

impl FilterRule {
    /// Exact match.
    pub fn eq(field: &str, data: Value) -> Self {
        Self {
            field: field.to_string(),
            op: "eq".to_string(),
            data,
        }
    }

    /// Substring match. B1 has no exact-name search.
    pub fn contains(field: &str, text: &str) -> Self {
        Self {
            field: field.to_string(),
            op: "cn".to_string(),
            data: Value::from(text),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListFilters {
    #[serde(rename = "groupOp")]
    pub group_op: String,
    pub rules: Vec<FilterRule>,
}

/// Body of every `*/list` request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListRequest {
    pub rows: u32,
    pub page: u32,
    pub sidx: String,
    pub sord: String,
    pub filters: ListFilters,
}

impl ListRequest {
    /// Page `page` (1-based) of `rows` records sorted by id.
    pub fn page(page: u32, rows: u32) -> Self {
        Self {
            rows,
            page,
            sidx: "id".to_string(),
            sord: "asc".to_string(),
            filters: ListFilters {
                group_op: "AND".to_string(),
                rules: Vec::new(),
            },
        }
    }

    pub fn with_rule(mut self, rule: FilterRule) -> Self {
        self.filters.rules.push(rule);
        self
    }
}

/// Rows of a list response. Missing `rows` means an empty page.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
}

/// Result of an item update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Sent to B1; holds the response body.
    Applied(Value),
    /// Dry run, nothing was sent.
    DryRun,
}

/// Result of a group deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    DryRun,
}
