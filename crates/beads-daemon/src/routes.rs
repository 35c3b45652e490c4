//! Router assembly: one route per RPC op under `/rpc/<op>`, plus the
//! `/events` SSE mutation stream and `/status`.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router as AxumRouter;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::events::MutationEvent;
use crate::rpc;
use crate::state::AppState;
use crate::token;

pub fn build_router(state: Arc<AppState>) -> AxumRouter {
    AxumRouter::new()
        .route("/rpc/create", post(rpc::create))
        .route("/rpc/update", post(rpc::update))
        .route("/rpc/show", post(rpc::show))
        .route("/rpc/list", get(rpc::list))
        .route("/rpc/resolve-id", post(rpc::resolve_id))
        .route("/rpc/add-label", post(rpc::add_label))
        .route("/rpc/add-dependency", post(rpc::add_dependency))
        .route("/rpc/agent-pod-list", get(rpc::agent_pod_list))
        .route("/rpc/decision-get", post(rpc::decision_get))
        .route("/status", get(rpc::status))
        .route("/events", get(sse_events))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Monotonic audit-event cursor; events with id > `since` are replayed
    /// before live events start flowing. Absent means "live only".
    #[serde(default)]
    since: Option<i64>,
    /// Server-side `key:value` filter, e.g. `type:create`.
    #[serde(default)]
    filter: Option<String>,
}

async fn sse_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, StatusCode> {
    if !token::verify(&headers, &state.sse_token) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let mut backlog = Vec::new();
    if let Some(since) = query.since {
        match state.store.get_all_events_since(since) {
            Ok(audit_events) => {
                for audit in audit_events {
                    if let Ok(issue) = state.store.get_issue(&audit.issue_id) {
                        backlog.push(MutationEvent::from_issue(&audit, &issue));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to replay backlog for /events since={since}");
            }
        }
    }

    let filter = query.filter;
    let live = stream::unfold(state.events.subscribe(), move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => return Some((event, rx)),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    let combined = stream::iter(backlog).chain(live).filter_map(move |event| {
        let filter = filter.clone();
        async move {
            let passes = match &filter {
                Some(f) => event.matches_filter(f),
                None => true,
            };
            if !passes {
                return None;
            }
            let payload = serde_json::to_string(&event).ok()?;
            Some(Ok(SseEvent::default().event(event.event_type.clone()).data(payload)))
        }
    });

    Ok(Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventHub;
    use beads_query::Router as IssueRouter;
    use beads_storage::sqlite::SqliteStore;
    use std::time::Instant;

    fn test_state() -> Arc<AppState> {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        Arc::new(AppState {
            store,
            router: IssueRouter::new(Default::default()),
            events: EventHub::new(),
            readonly: false,
            sse_token: "test-token".to_string(),
            started_at: Instant::now(),
            http_addr: "127.0.0.1:0".to_string(),
        })
    }

    #[test]
    fn router_builds_without_panicking() {
        let state = test_state();
        let _router = build_router(state);
    }
}
