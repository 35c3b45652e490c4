//! In-process mutation broadcast: every RPC write publishes a [`MutationEvent`]
//! both to the persisted audit trail (via `Storage::get_all_events_since`) and
//! to live SSE subscribers.

use beads_core::comment::Event as AuditEvent;
use beads_core::issue::Issue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// The SSE wire schema named by the RPC surface: `{Type, Timestamp, IssueID,
/// Title, NewStatus, IssueType}` plus decision-specific fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationEvent {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "Type")]
    pub event_type: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "IssueID")]
    pub issue_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "NewStatus", skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
    #[serde(rename = "IssueType")]
    pub issue_type: String,
    #[serde(rename = "RespondedBy", skip_serializing_if = "Option::is_none")]
    pub responded_by: Option<String>,
    #[serde(rename = "Selected", skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

impl MutationEvent {
    pub fn from_issue(audit: &AuditEvent, issue: &Issue) -> Self {
        Self {
            id: audit.id,
            event_type: audit.event_type.as_sse_type().to_string(),
            timestamp: audit.created_at,
            issue_id: issue.id.clone(),
            title: issue.title.clone(),
            new_status: matches!(
                audit.event_type,
                beads_core::enums::EventType::StatusChanged
                    | beads_core::enums::EventType::Closed
                    | beads_core::enums::EventType::Reopened
            )
            .then(|| issue.status.as_str().to_string()),
            issue_type: issue.issue_type.as_str().to_string(),
            responded_by: (audit.event_type == beads_core::enums::EventType::DecisionResponded)
                .then(|| audit.actor.clone()),
            selected: (audit.event_type == beads_core::enums::EventType::DecisionResponded)
                .then(|| audit.new_value.clone().unwrap_or_default()),
        }
    }

    /// `key:value` server-side filter, e.g. `type:create` or `issue:bd-1`.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let Some((key, value)) = filter.split_once(':') else {
            return true;
        };
        match key {
            "type" => self.event_type == value,
            "issue" => self.issue_id == value,
            "issue_type" => self.issue_type == value,
            _ => true,
        }
    }
}

/// Shared broadcast hub; cheap to clone, safe to hold across handler calls.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<MutationEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self { tx }
    }

    pub fn publish(&self, event: MutationEvent) {
        // A full channel with zero subscribers is not an error; nothing is
        // listening for a live feed but persisted audit rows still serve
        // `since` replay.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::enums::EventType;

    fn audit_event(event_type: EventType) -> AuditEvent {
        AuditEvent {
            id: 7,
            issue_id: "bd-1".to_string(),
            event_type,
            actor: "alice".to_string(),
            old_value: None,
            new_value: None,
            comment: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_changed_carries_new_status() {
        let issue = beads_core::issue::IssueBuilder::new("t").id("bd-1").build();
        let event = MutationEvent::from_issue(&audit_event(EventType::StatusChanged), &issue);
        assert_eq!(event.event_type, "update");
        assert!(event.new_status.is_some());
    }

    #[test]
    fn created_event_has_no_new_status() {
        let issue = beads_core::issue::IssueBuilder::new("t").id("bd-1").build();
        let event = MutationEvent::from_issue(&audit_event(EventType::Created), &issue);
        assert_eq!(event.event_type, "create");
        assert!(event.new_status.is_none());
    }

    #[test]
    fn filter_matches_on_type_key() {
        let issue = beads_core::issue::IssueBuilder::new("t").id("bd-1").build();
        let event = MutationEvent::from_issue(&audit_event(EventType::Created), &issue);
        assert!(event.matches_filter("type:create"));
        assert!(!event.matches_filter("type:update"));
        assert!(event.matches_filter("issue:bd-1"));
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe();
        let issue = beads_core::issue::IssueBuilder::new("t").id("bd-1").build();
        hub.publish(MutationEvent::from_issue(
            &audit_event(EventType::Created),
            &issue,
        ));
        let received = rx.recv().await.unwrap();
        assert_eq!(received.issue_id, "bd-1");
    }
}
