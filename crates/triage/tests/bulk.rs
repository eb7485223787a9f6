//! Bulk runs: scope filtering and per-issue failure isolation.

mod common;

use std::sync::Arc;

use common::{issue, FakeTracker, ACTOR, BLOCKED};
use triage::{BulkScope, TriageConfig, TriageError, TriageService};

fn service(fake: &Arc<FakeTracker>) -> TriageService {
    TriageService::new(fake.clone(), TriageConfig::default())
}

fn three_high_risk() -> Vec<triage::IssueSnapshot> {
    vec![
        issue("SUP-A", BLOCKED, 80, None),
        issue("SUP-B", BLOCKED, 80, None),
        issue("SUP-C", BLOCKED, 80, None),
    ]
}

#[tokio::test]
async fn test_one_failing_issue_does_not_abort_the_batch() {
    let fake = Arc::new(FakeTracker::new(three_high_risk()).failing("get_issue", "SUP-B"));

    let result = service(&fake)
        .run_bulk_recommended("SUP", BulkScope::HighRisk, ACTOR)
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.ok_count, 2);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.ok_count + result.failed_count, result.total);

    let keys: Vec<&str> = result.results.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["SUP-A", "SUP-B", "SUP-C"]);

    let failed = &result.results[1];
    assert!(!failed.ok);
    assert!(failed.error.as_deref().unwrap().contains("SUP-B"));
    assert!(failed.steps.is_empty());

    for ok in [&result.results[0], &result.results[2]] {
        assert!(ok.ok);
        assert_eq!(ok.steps.len(), 4);
        assert!(ok.draft.is_some());
    }
    assert_eq!(fake.comment_writes("SUP-C").len(), 2);
}

#[tokio::test]
async fn test_high_risk_scope_filters_by_tier() {
    let fake = Arc::new(FakeTracker::new(vec![
        issue("SUP-1", BLOCKED, 80, None),
        issue("SUP-2", BLOCKED, 30, Some("acc-owner")),
        issue("SUP-3", "In Progress", 200, None),
    ]));

    let result = service(&fake)
        .run_bulk_recommended("SUP", BulkScope::HighRisk, ACTOR)
        .await
        .unwrap();

    assert_eq!(result.total, 1);
    assert_eq!(result.results[0].key, "SUP-1");
    assert!(fake.comment_writes("SUP-2").is_empty());
}

#[tokio::test]
async fn test_all_scope_processes_every_issue() {
    let fake = Arc::new(FakeTracker::new(vec![
        issue("SUP-1", BLOCKED, 80, None),
        issue("SUP-2", BLOCKED, 30, Some("acc-owner")),
        issue("SUP-3", "In Progress", 2, Some("acc-owner")),
    ]));

    let result = service(&fake)
        .run_bulk_recommended("SUP", BulkScope::All, ACTOR)
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert_eq!(result.ok_count, 3);
    assert_eq!(result.failed_steps, 0);
    // SUP-3 has an empty plan.
    assert!(result.results[2].steps.is_empty());
}

#[tokio::test]
async fn test_step_failures_are_counted() {
    let fake = Arc::new(FakeTracker::new(three_high_risk()).failing("add_comment", "*"));

    let result = service(&fake)
        .run_bulk_recommended("SUP", BulkScope::HighRisk, ACTOR)
        .await
        .unwrap();

    assert_eq!(result.ok_count, 3);
    assert_eq!(result.failed_steps, 6);
    assert_eq!(result.skipped_steps, 0);
}

#[tokio::test]
async fn test_second_bulk_run_skips_cooled_down_steps() {
    let fake = Arc::new(FakeTracker::new(three_high_risk()));
    let service = service(&fake);

    service
        .run_bulk_recommended("SUP", BulkScope::All, ACTOR)
        .await
        .unwrap();
    let writes = fake.writes().len();

    let second = service
        .run_bulk_recommended("SUP", BulkScope::All, ACTOR)
        .await
        .unwrap();

    assert_eq!(fake.writes().len(), writes);
    assert_eq!(second.skipped_steps, 6);
}

#[tokio::test]
async fn test_search_failure_is_a_fetch_error() {
    let fake = Arc::new(FakeTracker::new(three_high_risk()).failing_search());

    let err = service(&fake)
        .run_bulk_recommended("SUP", BulkScope::All, ACTOR)
        .await
        .unwrap_err();

    assert!(matches!(err, TriageError::TrackerFetch(_)));
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_missing_scope_or_actor() {
    let fake = Arc::new(FakeTracker::new(three_high_risk()));
    let service = service(&fake);

    let err = service
        .run_bulk_recommended("", BulkScope::All, ACTOR)
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::MissingContext(_)));

    let err = service
        .run_bulk_recommended("SUP", BulkScope::All, "")
        .await
        .unwrap_err();
    assert!(matches!(err, TriageError::MissingContext(_)));

    assert_eq!(fake.calls(), 0);
}
