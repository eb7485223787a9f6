//! HTTP routes over the in-memory tracker.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{issue, FakeTracker, ACTOR, BLOCKED};
use triage::server::{build_router, AppState, ACTOR_HEADER};
use triage::{TriageConfig, TriageService};

fn app(fake: &Arc<FakeTracker>) -> Router {
    build_router(AppState {
        service: TriageService::new(fake.clone(), TriageConfig::default()),
        default_project: Some("SUP".into()),
    })
}

fn queue() -> Vec<triage::IssueSnapshot> {
    vec![
        issue("SUP-1", BLOCKED, 80, None),
        issue("SUP-2", "In Progress", 2, Some("acc-owner")),
    ]
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post(uri: &str, actor: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(actor) = actor {
        builder = builder.header(ACTOR_HEADER, actor);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let fake = Arc::new(FakeTracker::new(Vec::new()));
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app(&fake), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_at_risk_uses_default_project() {
    let fake = Arc::new(FakeTracker::new(queue()));
    let request = Request::get("/api/at-risk").body(Body::empty()).unwrap();

    let (status, body) = send(app(&fake), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["total"], 2);
    assert_eq!(body["stats"]["unassignedHigh"], 1);
    assert_eq!(body["issues"][0]["key"], "SUP-1");
}

#[tokio::test]
async fn test_at_risk_failure_returns_empty_issues() {
    let fake = Arc::new(FakeTracker::new(queue()).failing_search());
    let request = Request::get("/api/at-risk?project=SUP")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(&fake), request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["issues"], json!([]));
    assert!(body["error"].as_str().unwrap().contains("Tracker fetch failed"));
}

#[tokio::test]
async fn test_run_requires_actor_header() {
    let fake = Arc::new(FakeTracker::new(queue()));

    let (status, body) = send(app(&fake), post("/api/issues/SUP-1/run", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "missing_context");
    assert!(fake.writes().is_empty());
}

#[tokio::test]
async fn test_unknown_issue_is_not_found() {
    let fake = Arc::new(FakeTracker::new(queue()));

    let (status, body) = send(app(&fake), post("/api/issues/SUP-404/run", Some(ACTOR))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "tracker_fetch_failure");
}

#[tokio::test]
async fn test_run_returns_steps_and_draft() {
    let fake = Arc::new(FakeTracker::new(queue()));

    let (status, body) = send(app(&fake), post("/api/issues/SUP-1/run", Some(ACTOR))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "SUP-1");
    assert_eq!(body["outcome"]["tier"], "HIGH");
    assert_eq!(body["steps"][0]["key"], "assign_owner");
    assert_eq!(body["steps"][0]["status"], "done");
    assert!(body["draft"].as_str().unwrap().contains("SUP-1"));
}

#[tokio::test]
async fn test_cooldowns_route() {
    let fake = Arc::new(
        FakeTracker::new(queue()).with_comment("SUP-1", "[triage:playbook-note] Playbook", 2),
    );
    let request = Request::get("/api/issues/SUP-1/cooldowns")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app(&fake), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cooldowns"]["playbookNote"]["posted"], true);
    assert_eq!(body["cooldowns"]["requestUpdate"]["posted"], false);
}

#[tokio::test]
async fn test_bulk_defaults_to_high_risk() {
    let fake = Arc::new(FakeTracker::new(queue()));

    let (status, body) = send(app(&fake), post("/api/bulk", Some(ACTOR))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["okCount"], 1);
}

#[tokio::test]
async fn test_bulk_with_scope_body() {
    let fake = Arc::new(FakeTracker::new(queue()));
    let request = Request::post("/api/bulk")
        .header("content-type", "application/json")
        .header(ACTOR_HEADER, ACTOR)
        .body(Body::from(json!({ "scope": "all" }).to_string()))
        .unwrap();

    let (status, body) = send(app(&fake), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_atomic_command_routes() {
    let fake = Arc::new(FakeTracker::new(queue()));

    let (status, body) = send(
        app(&fake),
        post("/api/issues/SUP-1/assign-to-me", Some(ACTOR)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (status, body) = send(app(&fake), post("/api/issues/SUP-1/escalate", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["ok"], false);
}
