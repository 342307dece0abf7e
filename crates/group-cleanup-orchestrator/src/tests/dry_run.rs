use super::harness::{records, run_config, FakeCatalog, FAKE_BASE_URL};
use crate::workflow::GroupCleanupWorkflow;
use b1_catalog_client::RemoteId;
use serde_json::json;

fn catalog() -> FakeCatalog {
    FakeCatalog::new()
        .with_category(20, "Misc")
        .with_item(json!({"id": 1, "name": "xxx Widget", "groupId": 20, "group": "Misc", "code": "W-1"}))
        .with_item(json!({"id": 2, "name": "Widget", "groupId": 20, "group": "Misc", "code": "W-2"}))
}

#[tokio::test]
async fn dry_run_reports_counts_without_writing() {
    let catalog = FakeCatalog::new()
        .with_category(20, "Misc")
        .with_item(json!({"id": 1, "name": "xxx Widget", "groupId": 20, "group": "Misc", "code": "W-1"}));
    let items = records(json!([
        {"ID": 1, "Pavadinimas": "xxx Widget", "Grupė": "Misc"},
        {"ID": 2, "Pavadinimas": "Widget"}
    ]));

    let summary = GroupCleanupWorkflow::new(&catalog)
        .run(&items, &run_config(true))
        .await
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.base_url_used, FAKE_BASE_URL);
    assert_eq!(summary.received_items, 2);
    assert_eq!(summary.processed_items, 1);
    assert_eq!(summary.moved_ok, 1);
    assert_eq!(summary.code_cleared_ok, 1);
    assert_eq!(summary.target_group, "Target");
    assert_eq!(summary.target_group_id, Some(RemoteId::SYNTHETIC));
    assert_eq!(summary.categories_checked, 1);
    assert_eq!(summary.categories_deleted, 1);
    assert!(summary.failures.is_empty());

    assert_eq!(catalog.mutations(), 0);
    let item = catalog.item(1);
    assert_eq!(item.group_id, Some(RemoteId::Number(20)));
    assert_eq!(item.code, Some(json!("W-1")));
    assert_eq!(catalog.category_names(), vec!["Misc".to_string()]);
}

#[tokio::test]
async fn dry_run_keeps_groups_with_unmoved_items() {
    let catalog = catalog();
    let items = records(json!([{"ID": 1, "Pavadinimas": "xxx Widget", "Grupė": "Misc"}]));

    let summary = GroupCleanupWorkflow::new(&catalog)
        .run(&items, &run_config(true))
        .await
        .unwrap();

    assert_eq!(summary.categories_checked, 1);
    assert_eq!(summary.categories_deleted, 0);
    assert_eq!(catalog.mutations(), 0);
}

#[tokio::test]
async fn dry_run_treats_full_page_as_not_empty() {
    let catalog = FakeCatalog::new()
        .with_page_size(1)
        .with_category(20, "Misc")
        .with_item(json!({"id": 1, "name": "xxx Widget", "groupId": 20, "group": "Misc"}));
    let items = records(json!([{"ID": 1, "Pavadinimas": "xxx Widget"}]));

    let summary = GroupCleanupWorkflow::new(&catalog)
        .run(&items, &run_config(true))
        .await
        .unwrap();

    assert_eq!(summary.moved_ok, 1);
    assert_eq!(summary.already_clear, 1);
    assert_eq!(summary.categories_checked, 1);
    assert_eq!(summary.categories_deleted, 0);
}

#[tokio::test]
async fn dry_run_uses_existing_target() {
    let catalog = catalog().with_category(10, "Target");
    let items = records(json!([{"ID": 1, "Pavadinimas": "xxx Widget"}]));

    let summary = GroupCleanupWorkflow::new(&catalog)
        .run(&items, &run_config(true))
        .await
        .unwrap();

    assert_eq!(summary.target_group_id, Some(RemoteId::Number(10)));
    assert!(catalog.creates().is_empty());
    assert_eq!(catalog.mutations(), 0);
}
