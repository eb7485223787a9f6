//! HTTP surface for the triage service.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::bulk::BulkScope;
use crate::error::{TrackerError, TriageError};
use crate::models::CommandResult;
use crate::service::TriageService;

/// Header carrying the acting user's account id.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: TriageService,
    /// Project used when a request does not name one.
    pub default_project: Option<String>,
}

type ApiResponse = (StatusCode, Json<Value>);

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/at-risk", get(at_risk_issues))
        .route("/api/issues/{key}/cooldowns", get(issue_cooldowns))
        .route("/api/issues/{key}/run", post(run_recommended))
        .route("/api/issues/{key}/assign-to-me", post(assign_to_me))
        .route("/api/issues/{key}/request-update", post(request_update))
        .route("/api/issues/{key}/playbook-note", post(playbook_note))
        .route("/api/issues/{key}/escalate", post(escalate))
        .route("/api/bulk", post(run_bulk))
        // Health check
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct ProjectQuery {
    project: Option<String>,
}

/// Request body for a bulk run.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BulkRequest {
    scope: BulkScope,
    project: Option<String>,
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn at_risk_issues(
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> ApiResponse {
    let project = resolve_project(query.project, &state);
    match state.service.get_at_risk_issues(&project).await {
        Ok(report) => ok_json(&report),
        Err(e) => {
            warn!(error = %e, "At-risk listing failed");
            (
                status_for(&e),
                Json(json!({ "issues": [], "error": e.to_string() })),
            )
        }
    }
}

async fn issue_cooldowns(State(state): State<AppState>, Path(key): Path<String>) -> ApiResponse {
    match state.service.get_issue_cooldowns(&key).await {
        Ok(cooldowns) => ok_json(&json!({ "cooldowns": cooldowns })),
        Err(e) => error_json(&e),
    }
}

async fn run_recommended(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    let actor = actor_id(&headers);
    info!(issue_key = %key, "Run requested");
    match state.service.run_recommended(&key, &actor).await {
        Ok(outcome) => ok_json(&outcome),
        Err(e) => error_json(&e),
    }
}

async fn run_bulk(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResponse {
    // An empty body means the default scope.
    let request: BulkRequest = if body.is_empty() {
        BulkRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "ok": false, "error": format!("invalid request body: {e}") })),
                )
            }
        }
    };
    let project = resolve_project(request.project, &state);
    let actor = actor_id(&headers);
    info!(project = %project, scope = ?request.scope, "Bulk run requested");
    match state
        .service
        .run_bulk_recommended(&project, request.scope, &actor)
        .await
    {
        Ok(result) => ok_json(&result),
        Err(e) => error_json(&e),
    }
}

async fn assign_to_me(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    command_json(&state.service.assign_to_me(&key, &actor_id(&headers)).await)
}

async fn request_update(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    command_json(&state.service.request_update(&key, &actor_id(&headers)).await)
}

async fn playbook_note(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    command_json(&state.service.post_playbook_note(&key, &actor_id(&headers)).await)
}

async fn escalate(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> ApiResponse {
    command_json(&state.service.escalate(&key, &actor_id(&headers)).await)
}

fn actor_id(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn resolve_project(requested: Option<String>, state: &AppState) -> String {
    requested
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.default_project.clone())
        .unwrap_or_default()
}

fn ok_json<T: Serialize>(value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": e.to_string() })),
        ),
    }
}

fn error_json(error: &TriageError) -> ApiResponse {
    (
        status_for(error),
        Json(json!({ "ok": false, "error": error.to_string(), "kind": error.kind() })),
    )
}

fn command_json(result: &CommandResult) -> ApiResponse {
    let status = if result.ok {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(json!(result)))
}

fn status_for(error: &TriageError) -> StatusCode {
    match error {
        TriageError::MissingContext(_) => StatusCode::BAD_REQUEST,
        TriageError::TrackerFetch(TrackerError::NotFound(_)) => StatusCode::NOT_FOUND,
        TriageError::TrackerFetch(_) | TriageError::TrackerWrite(_) => StatusCode::BAD_GATEWAY,
        TriageError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
