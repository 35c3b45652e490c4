//! `resume`: reorients an actor at the start of a session by snapshotting
//! their in-progress work and recommending a next action per issue.

use beads_core::filter::IssueFilter;
use beads_storage::Storage;
use serde::Serialize;
use serde_json::json;

use crate::envelope::Envelope;
use crate::error::Result;

/// Signals used to decide whether a context refresh is recommended,
/// independent of whether there is outstanding WIP.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessCounters {
    pub sessions_closed: u32,
    pub file_rereads: u32,
    pub state_transition: bool,
}

impl FreshnessCounters {
    fn needs_refresh(&self) -> bool {
        self.sessions_closed >= 3 || self.file_rereads >= 5 || self.state_transition
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ActionClass {
    Resume,
    Close,
    Block,
    Relinquish,
}

#[derive(Debug, Clone, Serialize)]
struct ResumeEntry {
    issue_id: String,
    recommended_action: ActionClass,
    next_command: String,
    anchor_digest: String,
}

const ANCHOR_EXCERPT_BYTES: usize = 400;

pub fn resume(store: &dyn Storage, actor: &str, freshness: FreshnessCounters) -> Result<Envelope> {
    let issues = store.search_issues(
        "",
        &IssueFilter {
            assignee: Some(actor.to_string()),
            ..Default::default()
        },
    )?;
    let wip: Vec<_> = issues
        .into_iter()
        .filter(|i| i.status.is_active_wip() || i.status == beads_core::enums::Status::Blocked)
        .collect();

    let refresh_recommended = freshness.needs_refresh();

    if wip.is_empty() {
        let result = if refresh_recommended {
            "context_refresh_recommended"
        } else {
            "no_wip"
        };
        return Ok(Envelope::success("resume", result));
    }

    let entries: Vec<ResumeEntry> = wip
        .iter()
        .map(|issue| {
            let recommended_action = if issue.status == beads_core::enums::Status::Blocked {
                ActionClass::Block
            } else {
                ActionClass::Resume
            };
            let next_command = match recommended_action {
                ActionClass::Resume => format!("bd flow claim-next --actor {actor}"),
                ActionClass::Close => format!("bd flow close-safe {}", issue.id),
                ActionClass::Block => format!("bd flow block-with-context {}", issue.id),
                ActionClass::Relinquish => format!("bd update {} --assignee ''", issue.id),
            };
            let anchor_source = if !issue.notes.is_empty() {
                &issue.notes
            } else {
                &issue.description
            };
            let anchor_digest = truncate_bytes(anchor_source, ANCHOR_EXCERPT_BYTES);
            ResumeEntry {
                issue_id: issue.id.clone(),
                recommended_action,
                next_command,
                anchor_digest,
            }
        })
        .collect();

    let result = if refresh_recommended {
        "resume_required_context_refresh"
    } else {
        "resume_required"
    };

    Ok(Envelope::success("resume", result).with_details(json!({"wip": entries})))
}

fn truncate_bytes(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_string();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
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
    fn no_wip_and_fresh_context_returns_no_wip() {
        let store = store();
        let env = resume(&store, "alice", FreshnessCounters::default()).unwrap();
        assert_eq!(env.result, "no_wip");
    }

    #[test]
    fn stale_context_with_no_wip_recommends_refresh() {
        let store = store();
        let freshness = FreshnessCounters { sessions_closed: 4, ..Default::default() };
        let env = resume(&store, "alice", freshness).unwrap();
        assert_eq!(env.result, "context_refresh_recommended");
    }

    #[test]
    fn wip_present_returns_resume_required_with_snapshot() {
        let store = store();
        let issue = IssueBuilder::new("in progress work")
            .id("bd-1")
            .status(beads_core::enums::Status::InProgress)
            .assignee("alice")
            .build();
        store.create_issue(&issue, "alice").unwrap();

        let env = resume(&store, "alice", FreshnessCounters::default()).unwrap();
        assert_eq!(env.result, "resume_required");
        let wip = env.details.get("wip").unwrap().as_array().unwrap();
        assert_eq!(wip.len(), 1);
    }

    #[test]
    fn anchor_digest_is_truncated_to_400_bytes() {
        let store = store();
        let long_notes = "x".repeat(1000);
        let issue = IssueBuilder::new("work")
            .id("bd-1")
            .status(beads_core::enums::Status::InProgress)
            .assignee("alice")
            .notes(long_notes)
            .build();
        store.create_issue(&issue, "alice").unwrap();

        let env = resume(&store, "alice", FreshnessCounters::default()).unwrap();
        let wip = env.details.get("wip").unwrap().as_array().unwrap();
        let digest = wip[0].get("anchor_digest").unwrap().as_str().unwrap();
        assert!(digest.len() <= 403);
    }
}
