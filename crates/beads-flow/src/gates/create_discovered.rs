//! `create-discovered`: records a new issue found while working another,
//! wiring a `discovered-from` edge back to the source.

use beads_core::dependency::Dependency;
use beads_core::enums::DependencyType;
use beads_core::issue::Issue;
use beads_storage::Storage;
use chrono::Utc;
use serde_json::json;

use crate::envelope::Envelope;
use crate::error::Result;

pub struct CreateDiscoveredArgs<'a> {
    pub issue: Issue,
    pub source_id: &'a str,
    pub labels: &'a [String],
    pub actor: &'a str,
}

/// Creates the issue and its `discovered-from` edge as the primary,
/// required operation; label application is best-effort secondary work.
pub fn create_discovered(store: &dyn Storage, args: CreateDiscoveredArgs) -> Result<Envelope> {
    if store.get_issue(args.source_id).is_err() {
        return Ok(
            Envelope::policy_violation("create-discovered", "policy_violation").with_details(
                json!({"reason": format!("source issue {} not found", args.source_id)}),
            ),
        );
    }

    let id = args.issue.id.clone();
    store.create_issue(&args.issue, args.actor)?;
    store.add_dependency(
        &Dependency {
            issue_id: id.clone(),
            depends_on_id: args.source_id.to_string(),
            dep_type: DependencyType::DiscoveredFrom,
            created_at: Utc::now(),
            created_by: args.actor.to_string(),
            metadata: String::new(),
        },
        args.actor,
    )?;

    let mut failed_labels = Vec::new();
    for label in args.labels {
        if store.add_label(&id, label, args.actor).is_err() {
            failed_labels.push(label.clone());
        }
    }

    if failed_labels.is_empty() {
        Ok(Envelope::success("create-discovered", "created").with_issue_id(id))
    } else {
        let recovery = format!(
            "bd label add {id} {}",
            failed_labels.join(" ")
        );
        Ok(Envelope::partial_state("create-discovered", "partial_state", recovery)
            .with_issue_id(id)
            .with_details(json!({"failed_labels": failed_labels})))
    }
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
    fn creates_issue_with_discovered_from_edge() {
        let store = store();
        let source = IssueBuilder::new("parent work").id("bd-1").build();
        store.create_issue(&source, "alice").unwrap();

        let discovered = IssueBuilder::new("found a bug").id("bd-2").build();
        let env = create_discovered(
            &store,
            CreateDiscoveredArgs {
                issue: discovered,
                source_id: "bd-1",
                labels: &[],
                actor: "alice",
            },
        )
        .unwrap();
        assert!(env.ok);

        let deps = store.get_dependency_records("bd-2").unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].dep_type, DependencyType::DiscoveredFrom);
        assert_eq!(deps[0].depends_on_id, "bd-1");
    }

    #[test]
    fn rejects_unknown_source() {
        let store = store();
        let discovered = IssueBuilder::new("found a bug").id("bd-2").build();
        let env = create_discovered(
            &store,
            CreateDiscoveredArgs {
                issue: discovered,
                source_id: "bd-missing",
                labels: &[],
                actor: "alice",
            },
        )
        .unwrap();
        assert!(!env.ok);
    }
}
