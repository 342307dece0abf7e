//! Typed B1 reference-book operations.
//!
//! [`CatalogApi`] splits into wire primitives, which implementations
//! provide, and the provided operations built on top of them (paging,
//! exact-name lookup, ensure-group, dry-run handling). Keeping dry-run
//! handling in the provided methods means no implementation can issue a
//! mutating call during a dry run.

use crate::error::{CatalogError, CatalogResult};
use crate::transport::B1Transport;
use crate::types::{
    normalize_name, Category, DeleteOutcome, FilterRule, ItemPatch, ListPage, ListRequest,
    RemoteId, RemoteItem, UpdateOutcome,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// B1 reference-book endpoints.
pub mod paths {
    pub const ITEMS_LIST: &str = "/api/reference-book/items/list";
    pub const ITEMS_UPDATE: &str = "/api/reference-book/items/update";
    pub const GROUPS_LIST: &str = "/api/reference-book/item-groups/list";
    pub const GROUPS_CREATE: &str = "/api/reference-book/item-groups/create";
    pub const GROUPS_DELETE: &str = "/api/reference-book/item-groups/delete";
}

/// Rows requested by a name search.
pub const SEARCH_PAGE_SIZE: u32 = 50;

/// Upper bound on pages read by [`CatalogApi::list_all_categories`].
pub const MAX_LIST_PAGES: u32 = 1000;

/// What to do when the target group does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreationPolicy {
    /// Create it.
    #[default]
    CreateIfMissing,
    /// Fail with [`CatalogError::CategoryMissing`].
    RequireExisting,
}

/// Item groups already resolved during this run, keyed by normalized name.
#[derive(Debug, Clone, Default)]
pub struct CategoryCache {
    by_name: HashMap<String, Category>,
}

impl CategoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a full listing. The first group wins on duplicate names.
    pub fn seed(&mut self, categories: impl IntoIterator<Item = Category>) {
        for category in categories {
            self.by_name
                .entry(category.normalized_name())
                .or_insert(category);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.by_name.get(&normalize_name(name))
    }

    pub fn insert(&mut self, category: Category) {
        self.by_name.insert(category.normalized_name(), category);
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Operations on the B1 item catalog.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    // ---------------------------------------------------------------------
    // Wire primitives
    // ---------------------------------------------------------------------

    /// Minimal unfiltered items listing, returned raw.
    async fn probe_items(&self) -> CatalogResult<Value>;

    /// One page of item groups.
    async fn list_categories(
        &self,
        filter: Option<FilterRule>,
        page: u32,
        page_size: u32,
    ) -> CatalogResult<Vec<Category>>;

    /// Create an item group. Never called during a dry run.
    async fn create_category(&self, name: &str) -> CatalogResult<Category>;

    /// Current full record of an item.
    async fn get_item_by_id(&self, id: &RemoteId) -> CatalogResult<Option<RemoteItem>>;

    /// Submit a full item record. Never called during a dry run.
    async fn submit_item_update(&self, record: Value) -> CatalogResult<Value>;

    /// First `rows` items of a group.
    async fn list_items_in_category(
        &self,
        category_id: &RemoteId,
        rows: u32,
    ) -> CatalogResult<Vec<RemoteItem>>;

    /// Delete an item group. Never called during a dry run.
    async fn submit_category_delete(&self, id: &RemoteId) -> CatalogResult<()>;

    /// Base URL the catalog currently talks to.
    fn base_url_used(&self) -> String;

    /// Rows per page for full listings.
    fn page_size(&self) -> u32;

    // ---------------------------------------------------------------------
    // Provided operations
    // ---------------------------------------------------------------------

    /// Every item group, reading pages until an empty one.
    async fn list_all_categories(&self) -> CatalogResult<Vec<Category>> {
        let mut all = Vec::new();
        for page in 1..=MAX_LIST_PAGES {
            let rows = self.list_categories(None, page, self.page_size()).await?;
            if rows.is_empty() {
                break;
            }
            all.extend(rows);
        }
        debug!(count = all.len(), "Listed item groups");
        Ok(all)
    }

    /// Groups whose name contains `term`.
    async fn search_categories(&self, term: &str) -> CatalogResult<Vec<Category>> {
        self.list_categories(
            Some(FilterRule::contains("name", term.trim())),
            1,
            SEARCH_PAGE_SIZE,
        )
        .await
    }

    /// The group whose trimmed name equals `name` ignoring case.
    ///
    /// B1 only offers substring search, so the exact match happens here.
    async fn find_category_by_exact_name(&self, name: &str) -> CatalogResult<Option<Category>> {
        let key = normalize_name(name);
        let found = self
            .search_categories(name)
            .await?
            .into_iter()
            .find(|c| c.normalized_name() == key);
        Ok(found)
    }

    /// Resolve `name` to a group: cache, then search, then create.
    ///
    /// Dry runs return [`Category::synthetic`] instead of creating.
    async fn ensure_category(
        &self,
        name: &str,
        cache: &mut CategoryCache,
        dry_run: bool,
        policy: CreationPolicy,
    ) -> CatalogResult<Category> {
        if let Some(hit) = cache.get(name) {
            return Ok(hit.clone());
        }

        if let Some(found) = self.find_category_by_exact_name(name).await? {
            cache.insert(found.clone());
            return Ok(found);
        }

        if dry_run {
            debug!(name, "Item group missing, synthesizing for dry run");
            return Ok(Category::synthetic(name.trim()));
        }

        if policy == CreationPolicy::RequireExisting {
            return Err(CatalogError::CategoryMissing(name.trim().to_string()));
        }

        let created = self.create_category(name.trim()).await?;
        info!(name, id = %created.id, "Created item group");
        cache.insert(created.clone());
        Ok(created)
    }

    /// Write `patch` over the full `existing` record.
    async fn update_item(
        &self,
        existing: &RemoteItem,
        patch: &ItemPatch,
        dry_run: bool,
    ) -> CatalogResult<UpdateOutcome> {
        if dry_run {
            return Ok(UpdateOutcome::DryRun);
        }
        let record = existing.merged_with(patch)?;
        let response = self.submit_item_update(record).await?;
        Ok(UpdateOutcome::Applied(response))
    }

    /// Delete a group.
    async fn delete_category(&self, id: &RemoteId, dry_run: bool) -> CatalogResult<DeleteOutcome> {
        if dry_run {
            return Ok(DeleteOutcome::DryRun);
        }
        self.submit_category_delete(id).await?;
        Ok(DeleteOutcome::Deleted)
    }
}

/// [`CatalogApi`] over the real B1 API.
#[derive(Debug, Clone)]
pub struct B1Catalog {
    transport: B1Transport,
    page_size: u32,
}

impl B1Catalog {
    pub fn new(transport: B1Transport, page_size: u32) -> Self {
        Self {
            transport,
            page_size: page_size.max(1),
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        request: ListRequest,
    ) -> CatalogResult<Vec<T>> {
        let body = self.transport.post(path, &serde_json::to_value(request)?).await?;
        parse_rows(body)
    }
}

#[async_trait]
impl CatalogApi for B1Catalog {
    async fn probe_items(&self) -> CatalogResult<Value> {
        let request = ListRequest::page(1, 1);
        self.transport
            .post(paths::ITEMS_LIST, &serde_json::to_value(request)?)
            .await
    }

    async fn list_categories(
        &self,
        filter: Option<FilterRule>,
        page: u32,
        page_size: u32,
    ) -> CatalogResult<Vec<Category>> {
        let mut request = ListRequest::page(page, page_size);
        if let Some(rule) = filter {
            request = request.with_rule(rule);
        }
        self.list(paths::GROUPS_LIST, request).await
    }

    async fn create_category(&self, name: &str) -> CatalogResult<Category> {
        let response = self
            .transport
            .post(paths::GROUPS_CREATE, &json!({ "name": name }))
            .await?;
        let id = created_id(&response).ok_or_else(|| {
            CatalogError::Decode(format!("group create response has no id: {response}"))
        })?;
        Ok(Category::new(id, name))
    }

    async fn get_item_by_id(&self, id: &RemoteId) -> CatalogResult<Option<RemoteItem>> {
        let request = ListRequest::page(1, 1).with_rule(FilterRule::eq("id", id.to_json()));
        let rows: Vec<RemoteItem> = self.list(paths::ITEMS_LIST, request).await?;
        Ok(rows.into_iter().find(|item| item.id == *id))
    }

    async fn submit_item_update(&self, record: Value) -> CatalogResult<Value> {
        self.transport.post(paths::ITEMS_UPDATE, &record).await
    }

    async fn list_items_in_category(
        &self,
        category_id: &RemoteId,
        rows: u32,
    ) -> CatalogResult<Vec<RemoteItem>> {
        let request =
            ListRequest::page(1, rows.max(1)).with_rule(FilterRule::eq("groupId", category_id.to_json()));
        self.list(paths::ITEMS_LIST, request).await
    }

    async fn submit_category_delete(&self, id: &RemoteId) -> CatalogResult<()> {
        self.transport
            .post(paths::GROUPS_DELETE, &json!({ "id": id.to_json() }))
            .await?;
        Ok(())
    }

    fn base_url_used(&self) -> String {
        self.transport.base_url_used()
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

/// Rows of a list response body.
fn parse_rows<T: DeserializeOwned>(body: Value) -> CatalogResult<Vec<T>> {
    if !body.is_object() {
        return Err(CatalogError::Decode(format!(
            "list response is not an object: {body}"
        )));
    }
    let page: ListPage<T> = serde_json::from_value(body)?;
    Ok(page.rows)
}

/// Id of a newly created record, at `id` or `data.id`.
fn created_id(response: &Value) -> Option<RemoteId> {
    let raw = response
        .get("id")
        .or_else(|| response.get("data").and_then(|d| d.get("id")))?;
    serde_json::from_value(raw.clone()).ok()
}
