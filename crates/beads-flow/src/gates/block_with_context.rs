//! `block-with-context`: moves an issue to `blocked` with a required
//! context pack, optionally wiring a `blocks` dependency on the blocker.

use beads_core::dependency::Dependency;
use beads_core::enums::{DependencyType, Status};
use beads_storage::{IssueUpdates, Storage};
use chrono::Utc;
use serde_json::json;

use crate::envelope::Envelope;
use crate::error::Result;

pub struct BlockArgs<'a> {
    pub id: &'a str,
    pub context_pack: &'a str,
    pub blocker_id: Option<&'a str>,
    pub actor: &'a str,
}

pub fn block_with_context(store: &dyn Storage, args: BlockArgs) -> Result<Envelope> {
    if args.context_pack.trim().is_empty() {
        return Ok(
            Envelope::policy_violation("block-with-context", "policy_violation")
                .with_details(json!({"reason": "context pack is required"})),
        );
    }

    let issue = store.get_issue(args.id)?;

    if let Some(blocker_id) = args.blocker_id {
        // "must reside in the same workspace" -- a local lookup failure
        // means it doesn't.
        if store.get_issue(blocker_id).is_err() {
            return Ok(
                Envelope::policy_violation("block-with-context", "policy_violation")
                    .with_details(json!({"reason": "blocker is not in the local workspace"})),
            );
        }
    }

    let appended_notes = if issue.notes.is_empty() {
        args.context_pack.to_string()
    } else {
        format!("{}\n{}", issue.notes, args.context_pack)
    };
    store.update_issue(
        args.id,
        &IssueUpdates {
            status: Some(Status::Blocked),
            notes: Some(appended_notes),
            ..Default::default()
        },
        args.actor,
    )?;

    if let Some(blocker_id) = args.blocker_id {
        let dep = Dependency {
            issue_id: args.id.to_string(),
            depends_on_id: blocker_id.to_string(),
            dep_type: DependencyType::Blocks,
            created_at: Utc::now(),
            created_by: args.actor.to_string(),
            metadata: String::new(),
        };
        if let Err(e) = store.add_dependency(&dep, args.actor) {
            return Ok(Envelope::partial_state(
                "block-with-context",
                "partial_state",
                format!("bd dep add {} blocks {blocker_id}", args.id),
            )
            .with_issue_id(args.id.to_string())
            .with_details(json!({"error": e.to_string()})));
        }
    }

    Ok(Envelope::success("block-with-context", "blocked").with_issue_id(args.id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::issue::IssueBuilder;
    use beads_storage::SqliteStore;

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn requires_nonempty_context_pack() {
        let store = store();
        let issue = IssueBuilder::new("work").id("bd-1").build();
        store.create_issue(&issue, "alice").unwrap();

        let env = block_with_context(
            &store,
            BlockArgs {
                id: "bd-1",
                context_pack: "   ",
                blocker_id: None,
                actor: "alice",
            },
        )
        .unwrap();
        assert!(!env.ok);
        assert_eq!(env.exit_code(), 3);
    }

    #[test]
    fn blocks_with_context_and_dependency() {
        let store = store();
        let target = IssueBuilder::new("work").id("bd-1").build();
        let blocker = IssueBuilder::new("blocker").id("bd-2").build();
        store.create_issue(&target, "alice").unwrap();
        store.create_issue(&blocker, "alice").unwrap();

        let env = block_with_context(
            &store,
            BlockArgs {
                id: "bd-1",
                context_pack: "waiting on upstream API contract",
                blocker_id: Some("bd-2"),
                actor: "alice",
            },
        )
        .unwrap();
        assert!(env.ok);
        let after = store.get_issue("bd-1").unwrap();
        assert_eq!(after.status, Status::Blocked);
        assert!(after.notes.contains("waiting on upstream"));
        assert!(store.is_blocked("bd-1").unwrap());
    }

    #[test]
    fn rejects_blocker_outside_local_workspace() {
        let store = store();
        let target = IssueBuilder::new("work").id("bd-1").build();
        store.create_issue(&target, "alice").unwrap();

        let env = block_with_context(
            &store,
            BlockArgs {
                id: "bd-1",
                context_pack: "blocked on peer repo work",
                blocker_id: Some("external:peer:bd-9"),
                actor: "alice",
            },
        )
        .unwrap();
        assert!(!env.ok);
    }
}
