//! The cleanup run.
//!
//! ```text
//! probe → resolve target → filter "xxx" items → move + clear (buffered) → prune
//! ```
//!
//! Only the probe and the target lookup can fail the run. Everything after
//! that is per item or per group and ends up in [`CleanupSummary::failures`].

use crate::error::{WorkflowError, WorkflowResult};
use crate::normalize::{CategoryKeyNormalizer, SeparatorBaseWord};
use crate::request::{ItemRecord, RunConfig};
use crate::summary::{CleanupSummary, FailureStage, RunFailure};
use b1_catalog_client::{
    normalize_name, CatalogApi, CatalogResult, Category, CategoryCache, CodeField, ItemPatch,
    RemoteId, RemoteItem, UpdateOutcome,
};
use futures_util::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveState {
    Moved,
    AlreadyInTarget,
    NotMoved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeState {
    Cleared,
    AlreadyClear,
    NotCleared,
}

/// What happened to one candidate item.
#[derive(Debug)]
struct ItemOutcome {
    id: Option<RemoteId>,
    move_state: MoveState,
    code_state: CodeState,
    original_group: Option<String>,
    failures: Vec<RunFailure>,
}

impl ItemOutcome {
    fn new(id: Option<RemoteId>) -> Self {
        Self {
            id,
            move_state: MoveState::NotMoved,
            code_state: CodeState::NotCleared,
            original_group: None,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, stage: FailureStage, message: impl Into<String>) {
        let message = message.into();
        warn!(id = ?self.id, ?stage, %message, "Item step failed");
        self.failures.push(RunFailure {
            id: self.id.clone(),
            stage,
            message,
        });
    }
}

/// Moves marked items into the target group, clears their codes and deletes
/// the groups they leave empty.
pub struct GroupCleanupWorkflow<'a> {
    catalog: &'a dyn CatalogApi,
    normalizer: Box<dyn CategoryKeyNormalizer>,
}

impl<'a> GroupCleanupWorkflow<'a> {
    pub fn new(catalog: &'a dyn CatalogApi) -> Self {
        Self {
            catalog,
            normalizer: Box::new(SeparatorBaseWord),
        }
    }

    /// Replace the base-word rule used to find related groups.
    pub fn with_normalizer(mut self, normalizer: impl CategoryKeyNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub async fn run(
        &self,
        items: &[ItemRecord],
        config: &RunConfig,
    ) -> WorkflowResult<CleanupSummary> {
        let target_name = config.target_group_name.trim();
        info!(
            received = items.len(),
            dry_run = config.dry_run,
            target = target_name,
            "Starting item group cleanup"
        );

        self.sanity_probe().await?;

        let target = self.resolve_target(target_name, config).await?;
        debug!(id = %target.id, name = %target.name, "Resolved target group");

        // One pass per remote item; rows without an ID still get reported.
        let mut seen_ids = HashSet::new();
        let candidates: Vec<&ItemRecord> = items
            .iter()
            .filter(|item| item.is_candidate(&config.marker_prefix))
            .filter(|item| item.id.as_ref().map_or(true, |id| seen_ids.insert(id.clone())))
            .collect();
        debug!(candidates = candidates.len(), "Selected marked items");

        let pending: Vec<_> = candidates
            .iter()
            .map(|record| self.process_item(record, &target, config.dry_run))
            .collect();
        let outcomes: Vec<ItemOutcome> = stream::iter(pending)
            .buffered(config.item_concurrency.max(1))
            .collect()
            .await;

        let mut summary = CleanupSummary {
            dry_run: config.dry_run,
            target_group: target.name.clone(),
            target_group_id: Some(target.id.clone()),
            received_items: items.len(),
            processed_items: candidates.len(),
            ..Default::default()
        };

        let mut touched = BTreeSet::new();
        let mut moved_ids = HashSet::new();
        for outcome in outcomes {
            match outcome.move_state {
                MoveState::Moved => {
                    summary.moved_ok += 1;
                    if let Some(id) = &outcome.id {
                        moved_ids.insert(id.clone());
                    }
                    if let Some(group) = &outcome.original_group {
                        self.collect_keys(group, &target, &mut touched);
                    }
                }
                MoveState::AlreadyInTarget => summary.already_in_target += 1,
                MoveState::NotMoved => {}
            }
            match outcome.code_state {
                CodeState::Cleared => summary.code_cleared_ok += 1,
                CodeState::AlreadyClear => summary.already_clear += 1,
                CodeState::NotCleared => {}
            }
            summary.failures.extend(outcome.failures);
        }

        self.prune(&touched, &target, &moved_ids, config.dry_run, &mut summary)
            .await;

        summary.base_url_used = self.catalog.base_url_used();
        info!(
            processed = summary.processed_items,
            moved = summary.moved_ok,
            already_in_target = summary.already_in_target,
            cleared = summary.code_cleared_ok,
            already_clear = summary.already_clear,
            groups_checked = summary.categories_checked,
            groups_deleted = summary.categories_deleted,
            failures = summary.failures.len(),
            base_url = %summary.base_url_used,
            "Item group cleanup finished"
        );
        Ok(summary)
    }

    async fn sanity_probe(&self) -> WorkflowResult<()> {
        let body = self
            .catalog
            .probe_items()
            .await
            .map_err(|err| WorkflowError::SanityProbe(err.to_string()))?;
        if body.get("rows").is_none() {
            return Err(WorkflowError::SanityProbe(format!(
                "items list response has no rows: {body}"
            )));
        }
        Ok(())
    }

    async fn resolve_target(&self, name: &str, config: &RunConfig) -> WorkflowResult<Category> {
        let mut cache = CategoryCache::new();
        match self.catalog.list_all_categories().await {
            Ok(all) => cache.seed(all),
            Err(err) => warn!(error = %err, "Could not preload item groups, searching by name"),
        }
        self.catalog
            .ensure_category(name, &mut cache, config.dry_run, config.creation_policy)
            .await
            .map_err(|source| WorkflowError::TargetCategory {
                name: name.to_string(),
                source,
            })
    }

    async fn process_item(
        &self,
        record: &ItemRecord,
        target: &Category,
        dry_run: bool,
    ) -> ItemOutcome {
        let mut outcome = ItemOutcome::new(record.id.clone());
        let Some(id) = record.id.clone() else {
            outcome.fail(FailureStage::Fetch, "item record has no ID");
            return outcome;
        };

        let current = match self.catalog.get_item_by_id(&id).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                outcome.fail(FailureStage::Fetch, "item not found in B1");
                return outcome;
            }
            Err(err) => {
                outcome.fail(FailureStage::Fetch, err.to_string());
                return outcome;
            }
        };

        outcome.original_group = current
            .group
            .clone()
            .or_else(|| record.group.clone())
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        let latest = match self.move_item(&current, target, dry_run).await {
            Ok((state, latest)) => {
                outcome.move_state = state;
                latest
            }
            Err(err) => {
                outcome.fail(FailureStage::Move, err.to_string());
                None
            }
        };

        // A group write may have landed without a readback. Clearing over
        // `current` would send the old group back, so read the item again.
        let snapshot = match latest {
            Some(item) => item,
            None if dry_run || outcome.move_state == MoveState::AlreadyInTarget => current,
            None => match self.catalog.get_item_by_id(&id).await {
                Ok(Some(item)) => item,
                Ok(None) => {
                    outcome.fail(FailureStage::ClearCode, "item not found in B1 after move");
                    return outcome;
                }
                Err(err) => {
                    outcome.fail(
                        FailureStage::ClearCode,
                        format!("could not re-read item after move: {err}"),
                    );
                    return outcome;
                }
            },
        };

        match self.clear_code(snapshot, dry_run).await {
            Ok(state) => outcome.code_state = state,
            Err(err) => outcome.fail(FailureStage::ClearCode, err.to_string()),
        }
        outcome
    }

    /// Move by id, falling back to a move by name when the id write does not
    /// take. Returns the freshest snapshot when one was fetched.
    async fn move_item(
        &self,
        item: &RemoteItem,
        target: &Category,
        dry_run: bool,
    ) -> CatalogResult<(MoveState, Option<RemoteItem>)> {
        if item.is_in_group(target) {
            return Ok((MoveState::AlreadyInTarget, None));
        }

        let patch = ItemPatch::group_id(&target.id);
        if let UpdateOutcome::DryRun = self.catalog.update_item(item, &patch, dry_run).await? {
            return Ok((MoveState::Moved, None));
        }

        let mut latest = self.catalog.get_item_by_id(&item.id).await?;
        let id_took = latest
            .as_ref()
            .and_then(|after| after.group_id.as_ref())
            .is_some_and(|group_id| *group_id == target.id);

        if !id_took {
            debug!(id = %item.id, "Group id write did not take, retrying by name");
            let mut base = latest.clone().unwrap_or_else(|| item.clone());
            // The name must be the only group reference in the record.
            base.group_id = None;
            self.catalog
                .update_item(&base, &ItemPatch::group_name(&target.name), false)
                .await?;
            latest = self.catalog.get_item_by_id(&item.id).await?;
        }

        let moved = latest.as_ref().is_some_and(|after| after.is_in_group(target));
        if !moved {
            warn!(id = %item.id, target = %target.name, "Item is still outside the target group");
        }
        let state = if moved {
            MoveState::Moved
        } else {
            MoveState::NotMoved
        };
        Ok((state, latest))
    }

    /// Clear the first code field whose clear sticks, over the freshest record.
    async fn clear_code(&self, item: RemoteItem, dry_run: bool) -> CatalogResult<CodeState> {
        if item.codes_cleared() {
            return Ok(CodeState::AlreadyClear);
        }

        let mut latest = item;
        for field in CodeField::ALL {
            if latest.code_is_empty(field) {
                continue;
            }
            let patch = ItemPatch::clear_code(field);
            if let UpdateOutcome::DryRun = self.catalog.update_item(&latest, &patch, dry_run).await? {
                return Ok(CodeState::Cleared);
            }
            match self.catalog.get_item_by_id(&latest.id).await? {
                Some(after) if after.codes_cleared() => return Ok(CodeState::Cleared),
                Some(after) => latest = after,
                None => break,
            }
        }

        warn!(id = %latest.id, "Could not clear the product code on any field");
        Ok(CodeState::NotCleared)
    }

    /// Exact name and base word of a group an item left.
    fn collect_keys(&self, group: &str, target: &Category, keys: &mut BTreeSet<String>) {
        let exact = normalize_name(group);
        if exact.is_empty() || exact == target.normalized_name() {
            return;
        }
        if let Some(base) = self.normalizer.base_word(group) {
            keys.insert(base);
        }
        keys.insert(exact);
    }

    async fn prune(
        &self,
        keys: &BTreeSet<String>,
        target: &Category,
        moved_ids: &HashSet<RemoteId>,
        dry_run: bool,
        summary: &mut CleanupSummary,
    ) {
        let mut seen = HashSet::new();
        for key in keys {
            let found = match self.catalog.search_categories(key).await {
                Ok(found) => found,
                Err(err) => {
                    warn!(key = %key, error = %err, "Item group search failed");
                    summary.failures.push(RunFailure {
                        id: None,
                        stage: FailureStage::Prune,
                        message: format!("search '{key}': {err}"),
                    });
                    continue;
                }
            };

            for category in found {
                if category.id == target.id || category.normalized_name() == target.normalized_name()
                {
                    continue;
                }
                let related = category.normalized_name() == *key
                    || self.normalizer.base_word(&category.name).as_deref() == Some(key.as_str());
                if !related || !seen.insert(category.id.clone()) {
                    continue;
                }

                summary.categories_checked += 1;
                match self.prune_one(&category, moved_ids, dry_run).await {
                    Ok(true) => summary.categories_deleted += 1,
                    Ok(false) => {}
                    Err(err) => {
                        warn!(id = %category.id, name = %category.name, error = %err, "Could not prune item group");
                        summary.failures.push(RunFailure {
                            id: Some(category.id.clone()),
                            stage: FailureStage::Prune,
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Delete `category` if it is empty. Returns whether it was (or would be)
    /// deleted.
    async fn prune_one(
        &self,
        category: &Category,
        moved_ids: &HashSet<RemoteId>,
        dry_run: bool,
    ) -> CatalogResult<bool> {
        let empty = if dry_run {
            // Nothing moved yet: empty means only items this run would move.
            let rows = self.catalog.page_size();
            let members = self.catalog.list_items_in_category(&category.id, rows).await?;
            members.len() < rows as usize && members.iter().all(|item| moved_ids.contains(&item.id))
        } else {
            self.catalog
                .list_items_in_category(&category.id, 1)
                .await?
                .is_empty()
        };

        if !empty {
            debug!(id = %category.id, name = %category.name, "Item group still has items");
            return Ok(false);
        }

        self.catalog.delete_category(&category.id, dry_run).await?;
        info!(id = %category.id, name = %category.name, dry_run, "Deleted empty item group");
        Ok(true)
    }
}
