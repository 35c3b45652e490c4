//! Close gate: reason lint, verification requirement, gate-dependency and
//! blocker checks, then transition to `closed`.

use beads_core::enums::{IssueType, Status};
use beads_query::Router;
use beads_storage::Storage;
use serde_json::json;

use crate::envelope::Envelope;
use crate::error::Result;
use crate::reason_lint::lint_close_reason;

pub struct CloseSafeArgs<'a> {
    pub id_like: &'a str,
    pub reason: &'a str,
    pub verification: &'a str,
    pub allow_failure_reason: bool,
    pub actor: &'a str,
    pub session: &'a str,
}

/// Runs the close-safe pipeline against the local store. Only local
/// resolution is attempted; a not-found result here is itself a valid
/// `policy_violation` (the caller is expected to have already routed cross-
/// repo ids through the daemon/router layer before reaching this gate).
pub fn close_safe(store: &dyn Storage, router: &Router, args: CloseSafeArgs) -> Result<Envelope> {
    if let Err(failure) = lint_close_reason(args.reason, args.allow_failure_reason) {
        return Ok(violation("close-safe", &failure.to_string()));
    }
    if args.verification.trim().is_empty() {
        return Ok(violation("close-safe", "verification entry is required"));
    }

    let routed = match router.resolve_and_get_issue_with_routing(store, args.id_like) {
        Ok(r) => r,
        Err(e) => return Ok(violation("close-safe", &e.to_string())),
    };
    let issue = routed.issue.clone();
    let resolved_id = routed.resolved_id.clone();
    routed.close();

    if issue.status == Status::Tombstone {
        return Ok(violation("close-safe", "issue is tombstoned").with_issue_id(resolved_id));
    }
    if issue.issue_type == IssueType::Gate && issue.status == Status::Open {
        return Ok(
            violation("close-safe", "issue is itself an open gate").with_issue_id(resolved_id)
        );
    }

    if let Some(unmet) = unmet_gate_dependency(store, &resolved_id)? {
        return Ok(violation(
            "close-safe",
            &format!("gate {unmet} is not yet closed"),
        )
        .with_issue_id(resolved_id));
    }

    if store.is_blocked(&resolved_id)? {
        return Ok(
            violation("close-safe", "issue is blocked by open dependencies")
                .with_issue_id(resolved_id),
        );
    }

    store.add_comment(&resolved_id, args.actor, args.verification)?;
    store.close_issue(&resolved_id, args.reason, args.actor, args.session)?;

    Ok(Envelope::success("close-safe", "closed")
        .with_issue_id(resolved_id.clone())
        .with_details(json!({"verification": args.verification})))
}

fn violation(command: &str, reason: &str) -> Envelope {
    Envelope::policy_violation(command, "policy_violation")
        .with_details(json!({"reason": reason}))
}

/// A `blocks` dependency on a still-open `gate`-type issue is an explicit
/// gate-dependency, distinct from (and checked ahead of) the general
/// blocked-by-open-dependency check so the envelope can name the gate.
fn unmet_gate_dependency(store: &dyn Storage, issue_id: &str) -> Result<Option<String>> {
    let records = store.get_dependency_records(issue_id)?;
    for dep in records.iter().filter(|d| d.dep_type.affects_ready_work()) {
        if let Ok(blocker) = store.get_issue(&dep.depends_on_id) {
            if blocker.issue_type == IssueType::Gate && blocker.status != Status::Closed {
                return Ok(Some(blocker.id));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::dependency::Dependency;
    use beads_core::enums::DependencyType;
    use beads_core::issue::IssueBuilder;
    use beads_query::RouteTable;
    use beads_storage::SqliteStore;
    use chrono::Utc;
    use tempfile::tempdir;

    fn store_and_router() -> (SqliteStore, Router) {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("t.db")).unwrap();
        let router = Router::new(RouteTable::load(dir.path()).unwrap());
        (store, router)
    }

    fn args<'a>(id: &'a str, reason: &'a str, verification: &'a str) -> CloseSafeArgs<'a> {
        CloseSafeArgs {
            id_like: id,
            reason,
            verification,
            allow_failure_reason: false,
            actor: "alice",
            session: "sess-1",
        }
    }

    #[test]
    fn rejects_unsafe_reason_before_touching_the_store() {
        let (store, router) = store_and_router();
        let env = close_safe(&store, &router, args("bd-missing", "done", "n/a")).unwrap();
        assert!(!env.ok);
        assert_eq!(env.result, "policy_violation");
    }

    #[test]
    fn closes_an_unblocked_issue() {
        let (store, router) = store_and_router();
        let issue = IssueBuilder::new("do the thing").id("bd-1").build();
        store.create_issue(&issue, "alice").unwrap();

        let reason = "implemented the retry backoff and verified with a passing test";
        let env = close_safe(&store, &router, args("bd-1", reason, "ran suite, all green")).unwrap();
        assert!(env.ok, "{env:?}");
        assert_eq!(env.result, "closed");
        let after = store.get_issue("bd-1").unwrap();
        assert_eq!(after.status, beads_core::enums::Status::Closed);
    }

    #[test]
    fn blocked_issue_is_rejected() {
        let (store, router) = store_and_router();
        let blocker = IssueBuilder::new("blocker").id("bd-1").build();
        let target = IssueBuilder::new("target").id("bd-2").build();
        store.create_issue(&blocker, "alice").unwrap();
        store.create_issue(&target, "alice").unwrap();
        store
            .add_dependency(
                &Dependency {
                    issue_id: "bd-2".into(),
                    depends_on_id: "bd-1".into(),
                    dep_type: DependencyType::Blocks,
                    created_at: Utc::now(),
                    created_by: "alice".into(),
                    metadata: String::new(),
                },
                "alice",
            )
            .unwrap();

        let reason = "implemented the retry backoff and verified with a passing test";
        let env = close_safe(&store, &router, args("bd-2", reason, "ok")).unwrap();
        assert!(!env.ok);
        assert_eq!(env.result, "policy_violation");
    }

    #[test]
    fn open_gate_issue_cannot_close_itself_via_reason_alone() {
        let (store, router) = store_and_router();
        let gate = IssueBuilder::new("release gate")
            .id("bd-1")
            .issue_type(beads_core::enums::IssueType::Gate)
            .build();
        store.create_issue(&gate, "alice").unwrap();

        let reason = "implemented the retry backoff and verified with a passing test";
        let env = close_safe(&store, &router, args("bd-1", reason, "ok")).unwrap();
        assert!(!env.ok);
    }
}
