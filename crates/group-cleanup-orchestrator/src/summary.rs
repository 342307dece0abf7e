//! Result of a cleanup run.

use b1_catalog_client::RemoteId;
use serde::Serialize;

/// Step of the run at which an item or group failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Move,
    ClearCode,
    Prune,
}

/// A per-item or per-group error that did not stop the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunFailure {
    /// Item id, or group id for [`FailureStage::Prune`].
    pub id: Option<RemoteId>,
    pub stage: FailureStage,
    pub message: String,
}

/// Counts reported back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupSummary {
    pub base_url_used: String,
    pub dry_run: bool,
    pub target_group: String,
    pub target_group_id: Option<RemoteId>,
    pub received_items: usize,
    pub processed_items: usize,
    pub moved_ok: usize,
    pub already_in_target: usize,
    pub code_cleared_ok: usize,
    pub already_clear: usize,
    pub categories_checked: usize,
    pub categories_deleted: usize,
    pub failures: Vec<RunFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case() {
        let summary = CleanupSummary {
            base_url_used: "https://www.b1.lt".to_string(),
            dry_run: true,
            target_group: "Target".to_string(),
            target_group_id: Some(RemoteId::SYNTHETIC),
            received_items: 2,
            processed_items: 1,
            moved_ok: 1,
            code_cleared_ok: 1,
            failures: vec![RunFailure {
                id: Some(RemoteId::Number(9)),
                stage: FailureStage::ClearCode,
                message: "boom".to_string(),
            }],
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({
                "baseUrlUsed": "https://www.b1.lt",
                "dryRun": true,
                "targetGroup": "Target",
                "targetGroupId": -1,
                "receivedItems": 2,
                "processedItems": 1,
                "movedOk": 1,
                "alreadyInTarget": 0,
                "codeClearedOk": 1,
                "alreadyClear": 0,
                "categoriesChecked": 0,
                "categoriesDeleted": 0,
                "failures": [{"id": 9, "stage": "clear_code", "message": "boom"}]
            })
        );
    }
}
