//! In-memory B1 catalog for workflow tests.
//!
//! Implements only the wire primitives, so dry-run handling and paging run
//! through the same provided methods as against the real API. Every mutating
//! primitive is recorded.

use crate::request::{ItemRecord, RunConfig};
use async_trait::async_trait;
use b1_catalog_client::{
    normalize_name, CatalogApi, CatalogError, CatalogResult, Category, CodeField, FilterRule,
    RemoteId, RemoteItem,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashSet;

pub const FAKE_BASE_URL: &str = "https://fake.b1.lt";

/// How the fake reacts to group changes on item updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupWrites {
    /// `groupId` wins, `group` is used when no id is sent.
    #[default]
    Accept,
    /// `groupId` is ignored, only a changed `group` name moves the item.
    IgnoreId,
    /// Group changes are silently dropped.
    IgnoreAll,
}

#[derive(Default)]
struct FakeState {
    items: Vec<RemoteItem>,
    categories: Vec<Category>,
    group_writes: GroupWrites,
    ignored_code_fields: Vec<CodeField>,
    probe_body: Option<Value>,
    probe_fails: bool,
    listing_fails: bool,
    broken_items: HashSet<RemoteId>,
    failing_reads: HashSet<usize>,
    reads: usize,
    creates: Vec<String>,
    updates: Vec<Value>,
    deletes: Vec<RemoteId>,
}

pub struct FakeCatalog {
    state: Mutex<FakeState>,
    page_size: u32,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            page_size: 500,
        }
    }

    pub fn with_category(self, id: i64, name: &str) -> Self {
        self.state
            .lock()
            .categories
            .push(Category::new(RemoteId::Number(id), name));
        self
    }

    pub fn with_item(self, item: Value) -> Self {
        let item: RemoteItem = serde_json::from_value(item).unwrap();
        self.state.lock().items.push(item);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_group_writes(self, mode: GroupWrites) -> Self {
        self.state.lock().group_writes = mode;
        self
    }

    pub fn ignoring_code_field(self, field: CodeField) -> Self {
        self.state.lock().ignored_code_fields.push(field);
        self
    }

    pub fn with_probe_body(self, body: Value) -> Self {
        self.state.lock().probe_body = Some(body);
        self
    }

    pub fn with_failing_probe(self) -> Self {
        self.state.lock().probe_fails = true;
        self
    }

    pub fn with_failing_listing(self) -> Self {
        self.state.lock().listing_fails = true;
        self
    }

    pub fn with_broken_item(self, id: i64) -> Self {
        self.state.lock().broken_items.insert(RemoteId::Number(id));
        self
    }

    /// Fail the `n`th item read (1-based, counted across all items).
    pub fn with_failing_read(self, n: usize) -> Self {
        self.state.lock().failing_reads.insert(n);
        self
    }

    pub fn item(&self, id: i64) -> RemoteItem {
        let wanted = RemoteId::Number(id);
        self.state
            .lock()
            .items
            .iter()
            .find(|item| item.id == wanted)
            .cloned()
            .unwrap()
    }

    pub fn category_names(&self) -> Vec<String> {
        self.state
            .lock()
            .categories
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn creates(&self) -> Vec<String> {
        self.state.lock().creates.clone()
    }

    pub fn updates(&self) -> Vec<Value> {
        self.state.lock().updates.clone()
    }

    pub fn deletes(&self) -> Vec<RemoteId> {
        self.state.lock().deletes.clone()
    }

    /// Number of mutating calls that reached the fake.
    pub fn mutations(&self) -> usize {
        let state = self.state.lock();
        state.creates.len() + state.updates.len() + state.deletes.len()
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn probe_items(&self) -> CatalogResult<Value> {
        let state = self.state.lock();
        if state.probe_fails {
            return Err(CatalogError::Status {
                status: 401,
                body: "unauthorized".to_string(),
            });
        }
        Ok(state.probe_body.clone().unwrap_or_else(|| json!({"rows": []})))
    }

    async fn list_categories(
        &self,
        filter: Option<FilterRule>,
        page: u32,
        page_size: u32,
    ) -> CatalogResult<Vec<Category>> {
        let state = self.state.lock();
        let term = match filter {
            Some(rule) => Some(rule.data.as_str().unwrap_or_default().to_lowercase()),
            None if state.listing_fails => {
                return Err(CatalogError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                })
            }
            None => None,
        };
        let skip = (page.saturating_sub(1) * page_size) as usize;
        Ok(state
            .categories
            .iter()
            .filter(|c| term.as_ref().map_or(true, |t| c.name.to_lowercase().contains(t)))
            .skip(skip)
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn create_category(&self, name: &str) -> CatalogResult<Category> {
        let mut state = self.state.lock();
        let id = 1000 + state.creates.len() as i64;
        let category = Category::new(RemoteId::Number(id), name);
        state.categories.push(category.clone());
        state.creates.push(name.to_string());
        Ok(category)
    }

    async fn get_item_by_id(&self, id: &RemoteId) -> CatalogResult<Option<RemoteItem>> {
        let mut state = self.state.lock();
        state.reads += 1;
        if state.failing_reads.contains(&state.reads) {
            return Err(CatalogError::Status {
                status: 503,
                body: "read timed out".to_string(),
            });
        }
        if state.broken_items.contains(id) {
            return Err(CatalogError::Decode(format!("item {id} is broken")));
        }
        Ok(state.items.iter().find(|item| item.id == *id).cloned())
    }

    async fn submit_item_update(&self, record: Value) -> CatalogResult<Value> {
        let incoming: RemoteItem = serde_json::from_value(record.clone())?;
        let mut state = self.state.lock();
        state.updates.push(record);

        let Some(index) = state.items.iter().position(|item| item.id == incoming.id) else {
            return Err(CatalogError::Api {
                code: 404,
                message: "Item not found".to_string(),
                errors: Value::Null,
            });
        };
        let existing = state.items[index].clone();
        let by_id = |id: &RemoteId| state.categories.iter().find(|c| c.id == *id).cloned();
        let by_name = |name: &str| {
            state
                .categories
                .iter()
                .find(|c| c.normalized_name() == normalize_name(name))
                .cloned()
        };

        let mut stored = incoming.clone();
        stored.group_id = existing.group_id.clone();
        stored.group = existing.group.clone();
        let resolved = match state.group_writes {
            GroupWrites::Accept => match (&incoming.group_id, &incoming.group) {
                (Some(id), _) => by_id(id),
                (None, Some(name)) => by_name(name.as_str()),
                (None, None) => None,
            },
            GroupWrites::IgnoreId => incoming
                .group
                .as_deref()
                .filter(|name| Some(*name) != existing.group.as_deref())
                .and_then(by_name),
            GroupWrites::IgnoreAll => None,
        };
        if let Some(category) = resolved {
            stored.group_id = Some(category.id);
            stored.group = Some(category.name);
        }

        for field in &state.ignored_code_fields {
            match field {
                CodeField::Code => stored.code = existing.code.clone(),
                CodeField::ItemCode => stored.item_code = existing.item_code.clone(),
                CodeField::Sku => stored.sku = existing.sku.clone(),
            }
        }

        state.items[index] = stored;
        Ok(json!({"code": 200, "message": "OK"}))
    }

    async fn list_items_in_category(
        &self,
        category_id: &RemoteId,
        rows: u32,
    ) -> CatalogResult<Vec<RemoteItem>> {
        Ok(self
            .state
            .lock()
            .items
            .iter()
            .filter(|item| item.group_id.as_ref() == Some(category_id))
            .take(rows as usize)
            .cloned()
            .collect())
    }

    async fn submit_category_delete(&self, id: &RemoteId) -> CatalogResult<()> {
        let mut state = self.state.lock();
        state.categories.retain(|c| c.id != *id);
        state.deletes.push(id.clone());
        Ok(())
    }

    fn base_url_used(&self) -> String {
        FAKE_BASE_URL.to_string()
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// Input rows as sent by the caller.
pub fn records(rows: Value) -> Vec<ItemRecord> {
    serde_json::from_value(rows).unwrap()
}

pub fn run_config(dry_run: bool) -> RunConfig {
    RunConfig::new("Target", dry_run)
}
