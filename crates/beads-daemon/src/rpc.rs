//! Request/response RPC ops: one handler per `/rpc/<op>` route.
//!
//! Every handler returns the uniform `{Success, Error, Data}` envelope named
//! by the RPC surface; errors short-circuit via [`crate::error::ApiError`]
//! and `IntoResponse`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use beads_core::dependency::Dependency;
use beads_core::enums::{DependencyType, IssueType, Status};
use beads_core::filter::IssueFilter;
use beads_core::idgen;
use beads_core::issue::{DecisionPoint, Issue, IssueBuilder};
use beads_storage::IssueUpdates;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::events::MutationEvent;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RpcReply<T> {
    #[serde(rename = "Success")]
    pub success: bool,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "Data")]
    pub data: T,
}

impl<T> RpcReply<T> {
    fn ok(data: T) -> Self {
        Self { success: true, error: None, data }
    }
}

type RpcResult<T> = Result<Json<RpcReply<T>>, ApiError>;

/// Publishes the most recent persisted audit event for `issue_id` (there is
/// always at least one immediately after a mutating Storage call) to live
/// SSE subscribers.
fn publish_latest_event(state: &AppState, issue: &Issue) {
    match state.store.get_events(&issue.id, 1) {
        Ok(events) => {
            if let Some(audit) = events.first() {
                state.events.publish(MutationEvent::from_issue(audit, issue));
            }
        }
        Err(e) => tracing::warn!(issue_id = %issue.id, error = %e, "failed to read audit trail for SSE publish"),
    }
}

fn require_writable(state: &AppState) -> Result<(), ApiError> {
    if state.readonly {
        return Err(ApiError::ReadOnly);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRequest>,
) -> RpcResult<Issue> {
    require_writable(&state)?;
    if req.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("title must not be empty".to_string()));
    }

    let prefix = state
        .store
        .get_config("issue_prefix")
        .unwrap_or_else(|_| "bd".to_string());
    let count = state.store.get_statistics()?.total_issues as usize;
    let hash_len = idgen::compute_adaptive_length(
        count,
        idgen::adaptive_defaults::MIN_LENGTH,
        idgen::adaptive_defaults::MAX_LENGTH,
        idgen::adaptive_defaults::MAX_COLLISION_PROB,
    );
    let now = Utc::now();
    let id = idgen::generate_hash_id(&prefix, &req.title, &req.description, "daemon", now, hash_len, 0);

    let actor = req.actor.clone().unwrap_or_else(|| "daemon".to_string());
    let mut builder = IssueBuilder::new(req.title)
        .id(id)
        .description(req.description)
        .priority(req.priority)
        .created_by(actor.clone())
        .labels(req.labels);
    if let Some(issue_type) = &req.issue_type {
        builder = builder.issue_type(IssueType::from(issue_type.as_str()));
    }
    if let Some(assignee) = &req.assignee {
        builder = builder.assignee(assignee.clone());
    }
    let issue = builder.build();

    state.store.create_issue(&issue, &actor)?;

    if let Some(parent_id) = &req.parent_id {
        state.store.add_dependency(
            &Dependency {
                issue_id: issue.id.clone(),
                depends_on_id: parent_id.clone(),
                dep_type: DependencyType::ParentChild,
                created_at: now,
                created_by: actor.clone(),
                metadata: String::new(),
            },
            &actor,
        )?;
    }

    publish_latest_event(&state, &issue);
    Ok(Json(RpcReply::ok(issue)))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateRequest>,
) -> RpcResult<Issue> {
    require_writable(&state)?;
    let actor = req.actor.clone().unwrap_or_else(|| "daemon".to_string());
    let updates = IssueUpdates {
        title: req.title,
        description: req.description,
        status: req.status.map(|s| Status::from(s.as_str())),
        priority: req.priority,
        assignee: req.assignee,
        notes: req.notes,
        ..Default::default()
    };
    state.store.update_issue(&req.id, &updates, &actor)?;
    let issue = state.store.get_issue(&req.id)?;
    publish_latest_event(&state, &issue);
    Ok(Json(RpcReply::ok(issue)))
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

pub async fn show(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Value>,
) -> RpcResult<Issue> {
    let id = req
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidInput("id is required".to_string()))?;
    let routed = state
        .router
        .resolve_and_get_issue_with_routing(state.store.as_ref(), id)?;
    let issue = routed.issue.clone();
    routed.close();
    Ok(Json(RpcReply::ok(issue)))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub limit: Option<i32>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> RpcResult<Vec<Issue>> {
    let filter = IssueFilter {
        status: query.status.map(|s| Status::from(s.as_str())),
        issue_type: query.issue_type.map(|s| IssueType::from(s.as_str())),
        assignee: query.assignee,
        limit: query.limit,
        ..Default::default()
    };
    let issues = state.store.search_issues("", &filter)?;
    Ok(Json(RpcReply::ok(issues)))
}

// ---------------------------------------------------------------------------
// ResolveID
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ResolveIdResponse {
    pub resolved_id: String,
}

pub async fn resolve_id(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Value>,
) -> RpcResult<ResolveIdResponse> {
    let id_like = req
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidInput("id is required".to_string()))?;
    let resolved = state.router.resolve_partial_id(state.store.as_ref(), id_like)?;
    Ok(Json(RpcReply::ok(ResolveIdResponse { resolved_id: resolved })))
}

// ---------------------------------------------------------------------------
// AddLabel
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddLabelRequest {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub actor: Option<String>,
}

pub async fn add_label(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddLabelRequest>,
) -> RpcResult<Issue> {
    require_writable(&state)?;
    let actor = req.actor.unwrap_or_else(|| "daemon".to_string());
    state.store.add_label(&req.id, &req.label, &actor)?;
    let issue = state.store.get_issue(&req.id)?;
    publish_latest_event(&state, &issue);
    Ok(Json(RpcReply::ok(issue)))
}

// ---------------------------------------------------------------------------
// AddDependency
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AddDependencyRequest {
    pub id: String,
    pub depends_on: String,
    #[serde(default)]
    pub dep_type: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

pub async fn add_dependency(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddDependencyRequest>,
) -> RpcResult<Issue> {
    require_writable(&state)?;
    if state.store.get_issue(&req.depends_on).is_err() && !req.depends_on.starts_with("external:") {
        return Err(ApiError::InvalidInput(format!(
            "dependency target {} not found",
            req.depends_on
        )));
    }
    let actor = req.actor.unwrap_or_else(|| "daemon".to_string());
    let dep_type = req
        .dep_type
        .map(|s| DependencyType::from(s.as_str()))
        .unwrap_or(DependencyType::Blocks);
    state.store.add_dependency(
        &Dependency {
            issue_id: req.id.clone(),
            depends_on_id: req.depends_on,
            dep_type,
            created_at: Utc::now(),
            created_by: actor.clone(),
            metadata: String::new(),
        },
        &actor,
    )?;
    let issue = state.store.get_issue(&req.id)?;
    publish_latest_event(&state, &issue);
    Ok(Json(RpcReply::ok(issue)))
}

// ---------------------------------------------------------------------------
// AgentPodList
// ---------------------------------------------------------------------------

pub async fn agent_pod_list(State(state): State<Arc<AppState>>) -> RpcResult<Vec<Issue>> {
    let filter = IssueFilter {
        issue_type: Some(IssueType::Agent),
        ..Default::default()
    };
    let agents = state.store.search_issues("", &filter)?;
    Ok(Json(RpcReply::ok(agents)))
}

// ---------------------------------------------------------------------------
// DecisionGet
// ---------------------------------------------------------------------------

pub async fn decision_get(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Value>,
) -> RpcResult<Option<DecisionPoint>> {
    let id = req
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidInput("id is required".to_string()))?;
    let decision = state.store.get_decision_point(id)?;
    Ok(Json(RpcReply::ok(decision)))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

pub async fn status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "Success": true,
        "Error": Value::Null,
        "Data": {
            "HTTPAddr": state.http_addr,
            "Readonly": state.readonly,
            "UptimeSeconds": state.started_at.elapsed().as_secs(),
        }
    }))
}
