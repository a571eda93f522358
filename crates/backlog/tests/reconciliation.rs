//! Taxonomy reconciliation against the in-memory tracker.

use backlog::{
    reconcile_catalog, Catalog, InMemoryTracker, LabelColor, MilestoneState, RemoteId,
    TaxonomyRole, TrackerError,
};

fn key_ids(report: &backlog::TaxonomyReport) -> Vec<(String, RemoteId)> {
    report
        .resolved
        .iter()
        .map(|identity| (identity.key.to_string(), identity.remote_id))
        .collect()
}

#[tokio::test]
async fn reconciling_twice_converges_without_duplicates() {
    let tracker = InMemoryTracker::new();
    let catalog = Catalog::builtin();

    let first = reconcile_catalog(&tracker, &catalog).await;
    let labels_after_first = tracker.labels().await.len();
    let milestones_after_first = tracker.milestones().await.len();

    let second = reconcile_catalog(&tracker, &catalog).await;

    assert_eq!(key_ids(&first), key_ids(&second));
    assert_eq!(tracker.labels().await.len(), labels_after_first);
    assert_eq!(tracker.milestones().await.len(), milestones_after_first);

    let entries = catalog.entries().len();
    assert_eq!((first.created, first.existing), (entries, 0));
    assert_eq!((second.created, second.existing), (0, entries));
    assert!(first.failures.is_empty() && second.failures.is_empty());
}

#[tokio::test]
async fn pre_existing_objects_are_adopted() {
    let tracker = InMemoryTracker::new();
    let color = LabelColor::new("000000").unwrap();
    let epic = tracker.seed_label("epic 1: product domain", &color).await;
    let sprint = tracker
        .seed_milestone("Sprint 3: Pricing & Attributes", MilestoneState::Open)
        .await;

    let report = reconcile_catalog(&tracker, &Catalog::builtin()).await;

    let resolved_epic = report.resolved.get("Epic 1").unwrap();
    assert_eq!(resolved_epic.remote_id, RemoteId::from(epic.id));
    assert_eq!(resolved_epic.remote_name, "epic 1: product domain");

    let resolved_sprint = report
        .resolved
        .get_role("Sprint 3", TaxonomyRole::Sprint)
        .unwrap();
    assert_eq!(resolved_sprint.remote_id, RemoteId::from(sprint.number));
    assert_eq!(report.existing, 2);
}

#[tokio::test]
async fn closed_milestone_with_the_same_title_stays_unresolved() {
    let tracker = InMemoryTracker::new();
    tracker
        .seed_milestone("Sprint 4: Media & Search", MilestoneState::Closed)
        .await;

    let report = reconcile_catalog(&tracker, &Catalog::builtin()).await;

    assert!(report.resolved.get("Sprint 4").is_none());
    assert!(report.resolved.get("Sprint 5").is_some());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key.as_str(), "Sprint 4");
    assert!(matches!(report.failures[0].error, TrackerError::NotFound { .. }));
}

#[tokio::test]
async fn milestone_closed_after_a_run_is_not_found_on_the_next() {
    let tracker = InMemoryTracker::new();
    let catalog = Catalog::builtin();
    let first = reconcile_catalog(&tracker, &catalog).await;
    assert!(first.resolved.get("Sprint 4").is_some());

    assert!(tracker.close_milestone("Sprint 4: Media & Search").await);
    let second = reconcile_catalog(&tracker, &catalog).await;

    assert!(second.resolved.get("Sprint 4").is_none());
    assert_eq!(second.failures.len(), 1);
    assert_eq!(tracker.milestones().await.len(), catalog.sprints.len());
}

#[tokio::test]
async fn one_failing_entry_does_not_block_the_rest() {
    let tracker = InMemoryTracker::new();
    tracker.fail_label("SP: 13").await;
    tracker.fail_milestone("Sprint 7: Order State Machine").await;

    let catalog = Catalog::builtin();
    let report = reconcile_catalog(&tracker, &catalog).await;

    let failed: Vec<_> = report.failures.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(failed, vec!["SP13", "Sprint 7"]);
    assert_eq!(report.created, catalog.entries().len() - 2);
    assert!(report.resolved.get("SP21").is_some());

    let calls = tracker.calls().await;
    assert_eq!(calls.get_label, 0);
    assert_eq!(calls.list_open_milestones, 0);
}

#[tokio::test]
async fn status_and_priority_labels_exist_but_are_not_indexed() {
    let tracker = InMemoryTracker::new();

    let report = reconcile_catalog(&tracker, &Catalog::builtin()).await;

    let names: Vec<_> = tracker.labels().await.into_iter().map(|l| l.name).collect();
    assert!(names.iter().any(|n| n == "status: backlog"));
    assert!(names.iter().any(|n| n == "priority: critical"));
    assert!(report.resolved.get("status: backlog").is_none());
    assert!(report.resolved.get("priority: critical").is_none());
}
