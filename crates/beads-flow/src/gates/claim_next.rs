//! WIP=1 claim gate: an actor may hold at most one active issue.

use beads_core::enums::Status;
use beads_core::filter::{IssueFilter, WorkFilter};
use beads_storage::{Storage, StorageError};
use serde_json::json;

use crate::envelope::Envelope;
use crate::error::Result;

/// Claims the next eligible ready-work issue for `actor`.
///
/// - Returns `wip_blocked` (policy violation) if the actor already has an
///   `in_progress` or `hooked` issue.
/// - Walks ready work in order, attempting a claim on each candidate;
///   "already claimed" contention moves to the next candidate.
/// - Returns `no_ready` when the ready queue (after the filter) is empty.
/// - Returns `contention` if every candidate lost its claim race.
pub fn claim_next(store: &dyn Storage, actor: &str, filter: WorkFilter) -> Result<Envelope> {
    if actor.is_empty() {
        return Ok(Envelope::system_error("claim-next", "system_error")
            .with_details(json!({"error": "actor is required"})));
    }

    let wip = store.search_issues(
        "",
        &IssueFilter {
            assignee: Some(actor.to_string()),
            ..Default::default()
        },
    )?;
    let active_wip: Vec<&str> = wip
        .iter()
        .filter(|i| i.status.is_active_wip())
        .map(|i| i.id.as_str())
        .collect();
    if !active_wip.is_empty() {
        return Ok(Envelope::policy_violation("claim-next", "wip_blocked").with_details(json!({
            "blocking_ids": active_wip,
        })));
    }

    let ready = store.get_ready_work(&filter)?;
    if ready.is_empty() {
        return Ok(Envelope::success("claim-next", "no_ready"));
    }

    let mut contended = Vec::new();
    for candidate in &ready {
        match store.claim_issue(&candidate.id, actor, actor) {
            Ok(issue) => {
                return Ok(Envelope::success("claim-next", "claimed")
                    .with_issue_id(issue.id.clone())
                    .with_details(json!({"issue": issue})));
            }
            Err(StorageError::AlreadyClaimed { .. }) => {
                contended.push(candidate.id.clone());
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Envelope::policy_violation("claim-next", "contention")
        .with_details(json!({"contended_ids": contended})))
}
