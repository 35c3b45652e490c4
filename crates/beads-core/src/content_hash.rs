//! Deterministic content hashing for issues.
//!
//! Produces a SHA-256 hex digest over all substantive fields (excluding ID,
//! timestamps) so that identical content produces identical hashes across
//! all clones.

use sha2::{Digest, Sha256};

use crate::issue::Issue;

/// Separator byte written between fields.
const SEP: u8 = 0;

/// Computes a deterministic content hash for an issue.
///
/// Uses all substantive fields (excluding ID and timestamps) to ensure that
/// identical content produces identical hashes.
pub fn compute_content_hash(issue: &Issue) -> String {
    let mut h = Sha256::new();

    // Core fields in stable order.
    write_str(&mut h, &issue.title);
    write_str(&mut h, &issue.description);
    write_str(&mut h, &issue.design);
    write_str(&mut h, &issue.acceptance_criteria);
    write_str(&mut h, &issue.notes);
    write_str(&mut h, &issue.spec_id);
    write_str(&mut h, issue.status.as_str());
    write_int(&mut h, issue.priority);
    write_str(&mut h, issue.issue_type.as_str());
    write_str(&mut h, &issue.assignee);
    write_str(&mut h, &issue.owner);
    write_str(&mut h, &issue.created_by);

    // Optional fields.
    write_str_opt(&mut h, issue.external_ref.as_deref());
    write_str(&mut h, &issue.source_system);
    write_str(&mut h, &issue.close_reason);

    // Include metadata in content hash.
    if let Some(ref meta) = issue.metadata {
        write_str(&mut h, meta.get());
    } else {
        h.update([SEP]);
    }

    // Advice hook.
    if let Some(advice) = &issue.advice {
        write_str(&mut h, &advice.command);
        write_str(&mut h, advice.trigger.as_str());
        write_int(&mut h, advice.timeout);
        write_str(&mut h, advice.on_failure.as_str());
    } else {
        h.update([SEP]);
    }

    // Decision point.
    if let Some(decision) = &issue.decision {
        write_str(&mut h, &decision.prompt);
        for opt in &decision.options {
            write_str(&mut h, opt);
        }
        write_str(&mut h, &decision.selected_option);
        write_str(&mut h, &decision.response_text);
        write_str(&mut h, &decision.responded_by);
    } else {
        h.update([SEP]);
    }

    // Skill record.
    if let Some(skill) = &issue.skill {
        write_str(&mut h, &skill.name);
        write_str(&mut h, &skill.version);
        write_str(&mut h, &skill.category);
        for i in &skill.inputs {
            write_str(&mut h, i);
        }
        for o in &skill.outputs {
            write_str(&mut h, o);
        }
        write_str(&mut h, &skill.content);
    } else {
        h.update([SEP]);
    }

    // Agent record.
    if let Some(agent) = &issue.agent {
        write_str(&mut h, agent.agent_state.as_str());
        write_str(&mut h, &agent.hook_bead);
        write_str(&mut h, &agent.role_bead);
        write_str(&mut h, &agent.role_type);
        write_str(&mut h, &agent.rig);
    } else {
        h.update([SEP]);
    }

    format!("{:x}", h.finalize())
}

// -- helper writers --------------------------------------------------------

fn write_str(h: &mut Sha256, s: &str) {
    h.update(s.as_bytes());
    h.update([SEP]);
}

fn write_int(h: &mut Sha256, n: i32) {
    h.update(n.to_string().as_bytes());
    h.update([SEP]);
}

fn write_str_opt(h: &mut Sha256, s: Option<&str>) {
    if let Some(s) = s {
        h.update(s.as_bytes());
    }
    h.update([SEP]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::IssueType;
    use crate::issue::{AdviceHook, IssueBuilder};

    #[test]
    fn content_hash_deterministic() {
        let issue = IssueBuilder::new("Test issue")
            .description("A description")
            .priority(2)
            .build();

        let hash1 = compute_content_hash(&issue);
        let hash2 = compute_content_hash(&issue);
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 hex = 64 chars
    }

    #[test]
    fn content_hash_differs_on_change() {
        let issue1 = IssueBuilder::new("Title A").build();
        let issue2 = IssueBuilder::new("Title B").build();
        assert_ne!(compute_content_hash(&issue1), compute_content_hash(&issue2));
    }

    #[test]
    fn content_hash_differs_on_advice_hook() {
        let issue1 = IssueBuilder::new("Same title")
            .issue_type(IssueType::Advice)
            .build();
        let issue2 = IssueBuilder::new("Same title")
            .issue_type(IssueType::Advice)
            .advice(AdviceHook {
                command: "echo hi".into(),
                ..Default::default()
            })
            .build();
        assert_ne!(compute_content_hash(&issue1), compute_content_hash(&issue2));
    }

    #[test]
    fn content_hash_ignores_id_and_timestamps() {
        let mut issue1 = IssueBuilder::new("Same content").build();
        let mut issue2 = IssueBuilder::new("Same content").build();

        issue1.id = "bd-aaa".into();
        issue2.id = "bd-bbb".into();
        issue1.created_at = chrono::Utc::now();
        issue2.created_at = chrono::DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);

        assert_eq!(compute_content_hash(&issue1), compute_content_hash(&issue2));
    }
}
