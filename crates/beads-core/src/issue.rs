//! Issue struct -- the central domain model for the beads system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::enums::{AdviceOnFailure, AdviceTrigger, AgentState, IssueType, Status};

/// Helper for `skip_serializing_if` on `bool` fields.
fn is_false(b: &bool) -> bool {
    !b
}

/// Helper for `skip_serializing_if` on `i32` fields (priority: 0 is valid, never skip).
fn is_zero_priority(_p: &i32) -> bool {
    false
}

/// Helper for `skip_serializing_if` on `Vec` fields.
fn is_empty_vec<T>(v: &Vec<T>) -> bool {
    v.is_empty()
}

/// Helper for `skip_serializing_if` on timeout seconds (0 is a meaningful "no timeout" value).
fn is_zero_timeout(t: &i32) -> bool {
    *t == 0
}

/// An advice hook: a command run at a trigger point, attached to an `advice`-type issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdviceHook {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    #[serde(default, skip_serializing_if = "AdviceTrigger::is_default")]
    pub trigger: AdviceTrigger,

    /// Seconds before the hook is killed. 0..=300, default 30.
    #[serde(default = "default_advice_timeout", skip_serializing_if = "is_zero_timeout")]
    pub timeout: i32,

    #[serde(default, skip_serializing_if = "AdviceOnFailure::is_default")]
    pub on_failure: AdviceOnFailure,
}

fn default_advice_timeout() -> i32 {
    30
}

impl Default for AdviceHook {
    fn default() -> Self {
        Self {
            command: String::new(),
            trigger: AdviceTrigger::default(),
            timeout: default_advice_timeout(),
            on_failure: AdviceOnFailure::default(),
        }
    }
}

/// A decision point: a prompt with enumerated options, attached to a `decision`-type issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DecisionPoint {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prompt: String,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub options: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub selected_option: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response_text: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub responded_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl DecisionPoint {
    /// Returns `true` once a response has been recorded.
    pub fn is_responded(&self) -> bool {
        self.responded_at.is_some()
    }
}

/// A reusable capability record, attached to a `skill`-type issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SkillRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub inputs: Vec<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub outputs: Vec<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub examples: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

/// Self-reported agent identity/state, attached to an `agent`-type issue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AgentRecord {
    #[serde(default, skip_serializing_if = "AgentState::is_default")]
    pub agent_state: AgentState,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hook_bead: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role_bead: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub rig: String,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub advice_subscriptions: Vec<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub advice_subscriptions_exclude: Vec<String>,
}

/// Represents a trackable work item.
///
/// Fields are organised into logical groups for maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    // ===== Core Identification =====
    #[serde(default)]
    pub id: String,

    /// Internal: SHA256 of canonical content -- NOT exported to JSONL.
    #[serde(skip)]
    pub content_hash: String,

    // ===== Issue Content =====
    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub design: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub acceptance_criteria: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub spec_id: String,

    // ===== Status & Workflow =====
    #[serde(default, skip_serializing_if = "Status::is_default")]
    pub status: Status,

    /// Priority 0-4. No skip: 0 is valid (P0/critical).
    #[serde(default, skip_serializing_if = "is_zero_priority")]
    pub priority: i32,

    #[serde(default, skip_serializing_if = "IssueType::is_default")]
    pub issue_type: IssueType,

    // ===== Assignment =====
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub assignee: String,

    /// Human owner for CV attribution (git author email).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<i32>,

    // ===== Timestamps =====
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub close_reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub closed_by_session: String,

    // ===== Time-Based Scheduling =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defer_until: Option<DateTime<Utc>>,

    // ===== External Integration =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_system: String,

    // ===== Custom Metadata =====
    /// Arbitrary JSON data for extension points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Box<serde_json::value::RawValue>>,

    // ===== Internal Routing (not exported to JSONL) =====
    /// Which repo owns this issue (multi-repo support).
    #[serde(skip)]
    pub source_repo: String,

    // ===== Relational Data (populated for export/import) =====
    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub dependencies: Vec<Dependency>,

    #[serde(default, skip_serializing_if = "is_empty_vec")]
    pub comments: Vec<crate::comment::Comment>,

    // ===== Sub-records (valid only for the matching `issue_type`) =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<AdviceHook>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<DecisionPoint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<SkillRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentRecord>,
}

impl Default for Issue {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            content_hash: String::new(),
            title: String::new(),
            description: String::new(),
            design: String::new(),
            acceptance_criteria: String::new(),
            notes: String::new(),
            spec_id: String::new(),
            status: Status::Open,
            priority: 0,
            issue_type: IssueType::Task,
            assignee: String::new(),
            owner: String::new(),
            estimated_minutes: None,
            created_at: now,
            created_by: String::new(),
            updated_at: now,
            closed_at: None,
            close_reason: String::new(),
            closed_by_session: String::new(),
            due_at: None,
            defer_until: None,
            external_ref: None,
            source_system: String::new(),
            metadata: None,
            source_repo: String::new(),
            labels: Vec::new(),
            dependencies: Vec::new(),
            comments: Vec::new(),
            advice: None,
            decision: None,
            skill: None,
            agent: None,
        }
    }
}

impl Issue {
    /// Applies default values for fields omitted during JSONL import.
    ///
    /// - Status defaults to Open if empty
    /// - IssueType defaults to Task if empty
    pub fn set_defaults(&mut self) {
        if self.status == Status::Custom(String::new()) || self.status.as_str().is_empty() {
            self.status = Status::Open;
        }
        if self.issue_type == IssueType::Custom(String::new())
            || self.issue_type.as_str().is_empty()
        {
            self.issue_type = IssueType::Task;
        }
    }
}

/// Builder for constructing an [`Issue`] with a fluent API.
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    /// Creates a new builder with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        let mut issue = Issue::default();
        issue.title = title.into();
        Self { issue }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.issue.id = id.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = description.into();
        self
    }

    pub fn design(mut self, design: impl Into<String>) -> Self {
        self.issue.design = design.into();
        self
    }

    pub fn acceptance_criteria(mut self, ac: impl Into<String>) -> Self {
        self.issue.acceptance_criteria = ac.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.issue.notes = notes.into();
        self
    }

    pub fn spec_id(mut self, spec_id: impl Into<String>) -> Self {
        self.issue.spec_id = spec_id.into();
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.issue.status = status;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.issue.priority = priority;
        self
    }

    pub fn issue_type(mut self, issue_type: IssueType) -> Self {
        self.issue.issue_type = issue_type;
        self
    }

    pub fn assignee(mut self, assignee: impl Into<String>) -> Self {
        self.issue.assignee = assignee.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.issue.owner = owner.into();
        self
    }

    pub fn estimated_minutes(mut self, minutes: i32) -> Self {
        self.issue.estimated_minutes = Some(minutes);
        self
    }

    pub fn created_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.created_at = t;
        self
    }

    pub fn created_by(mut self, by: impl Into<String>) -> Self {
        self.issue.created_by = by.into();
        self
    }

    pub fn updated_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.updated_at = t;
        self
    }

    pub fn closed_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.closed_at = Some(t);
        self
    }

    pub fn close_reason(mut self, reason: impl Into<String>) -> Self {
        self.issue.close_reason = reason.into();
        self
    }

    pub fn due_at(mut self, t: DateTime<Utc>) -> Self {
        self.issue.due_at = Some(t);
        self
    }

    pub fn defer_until(mut self, t: DateTime<Utc>) -> Self {
        self.issue.defer_until = Some(t);
        self
    }

    pub fn external_ref(mut self, ext: impl Into<String>) -> Self {
        self.issue.external_ref = Some(ext.into());
        self
    }

    pub fn source_system(mut self, sys: impl Into<String>) -> Self {
        self.issue.source_system = sys.into();
        self
    }

    pub fn labels(mut self, labels: Vec<String>) -> Self {
        self.issue.labels = labels;
        self
    }

    pub fn advice(mut self, advice: AdviceHook) -> Self {
        self.issue.advice = Some(advice);
        self
    }

    pub fn decision(mut self, decision: DecisionPoint) -> Self {
        self.issue.decision = Some(decision);
        self
    }

    pub fn skill(mut self, skill: SkillRecord) -> Self {
        self.issue.skill = Some(skill);
        self
    }

    pub fn agent(mut self, agent: AgentRecord) -> Self {
        self.issue.agent = Some(agent);
        self
    }

    /// Consumes the builder and returns the constructed [`Issue`].
    pub fn build(self) -> Issue {
        self.issue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_issue() {
        let issue = Issue::default();
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.issue_type, IssueType::Task);
        assert_eq!(issue.priority, 0);
    }

    #[test]
    fn builder_basic() {
        let issue = IssueBuilder::new("Fix the bug")
            .priority(2)
            .status(Status::InProgress)
            .issue_type(IssueType::Bug)
            .assignee("alice")
            .build();

        assert_eq!(issue.title, "Fix the bug");
        assert_eq!(issue.priority, 2);
        assert_eq!(issue.status, Status::InProgress);
        assert_eq!(issue.issue_type, IssueType::Bug);
        assert_eq!(issue.assignee, "alice");
    }

    #[test]
    fn issue_serde_roundtrip() {
        let issue = IssueBuilder::new("Test issue")
            .id("bd-abc123")
            .priority(1)
            .description("A test description")
            .build();

        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();

        assert_eq!(back.title, "Test issue");
        assert_eq!(back.id, "bd-abc123");
        assert_eq!(back.priority, 1);
        assert_eq!(back.description, "A test description");
    }

    #[test]
    fn issue_set_defaults() {
        let json = r#"{"title": "hello"}"#;
        let mut issue: Issue = serde_json::from_str(json).unwrap();
        // After deserialization of empty enum, they will be Custom("") -- set_defaults fixes this
        issue.set_defaults();
        assert_eq!(issue.status, Status::Open);
        assert_eq!(issue.issue_type, IssueType::Task);
    }

    #[test]
    fn advice_hook_default_timeout() {
        let hook = AdviceHook::default();
        assert_eq!(hook.timeout, 30);
        assert_eq!(hook.on_failure, AdviceOnFailure::Warn);
    }

    #[test]
    fn decision_point_roundtrip() {
        let issue = IssueBuilder::new("Pick one")
            .issue_type(IssueType::Decision)
            .decision(DecisionPoint {
                prompt: "Which backend?".into(),
                options: vec!["sqlite".into(), "postgres".into()],
                ..Default::default()
            })
            .build();
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        let decision = back.decision.expect("decision present");
        assert_eq!(decision.options.len(), 2);
        assert!(!decision.is_responded());
    }

    #[test]
    fn agent_record_roundtrip() {
        let issue = IssueBuilder::new("worker-1")
            .issue_type(IssueType::Agent)
            .agent(AgentRecord {
                agent_state: AgentState::Running,
                rig: "default".into(),
                ..Default::default()
            })
            .build();
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.agent.unwrap().agent_state, AgentState::Running);
    }
}
