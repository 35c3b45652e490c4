//! Client-side event matcher: an AND-list of `{field, op, value}` conditions,
//! buildable from sugar flags or a compact string, tested against a
//! [`MutationEvent`].

use serde_json::Value;

use crate::events::MutationEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOp {
    Eq,
    Contains,
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub op: MatchOp,
    pub value: String,
}

/// AND-list of conditions. Empty matches everything.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    conditions: Vec<Condition>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, op: MatchOp, value: impl Into<String>) -> Self {
        self.conditions.push(Condition { field: field.into(), op, value: value.into() });
        self
    }

    pub fn issue(self, id: impl Into<String>) -> Self {
        self.with("issue", MatchOp::Eq, id)
    }

    pub fn event_type(self, ty: impl Into<String>) -> Self {
        self.with("type", MatchOp::Eq, ty)
    }

    pub fn until_status(self, status: impl Into<String>) -> Self {
        self.with("status", MatchOp::Eq, status)
    }

    /// Parses a compact string of comma-separated `field=value` or
    /// `field~=value` conditions, e.g. `"issue=bd-1,type~=status"`.
    pub fn parse(spec: &str) -> Self {
        let mut matcher = Self::new();
        for clause in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (field, op, value) = if let Some((f, v)) = clause.split_once("~=") {
                (f, MatchOp::Contains, v)
            } else if let Some((f, v)) = clause.split_once('=') {
                (f, MatchOp::Eq, v)
            } else {
                continue;
            };
            matcher = matcher.with(field.trim(), op, value.trim());
        }
        matcher
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, event: &MutationEvent) -> bool {
        let json = serde_json::to_value(event).unwrap_or(Value::Null);
        self.conditions.iter().all(|c| condition_matches(c, event, &json))
    }
}

fn condition_matches(condition: &Condition, event: &MutationEvent, json: &Value) -> bool {
    let actual = match condition.field.as_str() {
        "issue" => Some(event.issue_id.clone()),
        "type" => Some(event.event_type.clone()),
        "status" | "until-status" | "new_status" => event.new_status.clone(),
        "issue_type" => Some(event.issue_type.clone()),
        other => json.get(other).and_then(Value::as_str).map(str::to_string),
    };
    match (actual, &condition.op) {
        (Some(value), MatchOp::Eq) => value == condition.value,
        (Some(value), MatchOp::Contains) => value.contains(&condition.value),
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event() -> MutationEvent {
        MutationEvent {
            id: 1,
            event_type: "update".to_string(),
            timestamp: Utc::now(),
            issue_id: "bd-1".to_string(),
            title: "fix the thing".to_string(),
            new_status: Some("closed".to_string()),
            issue_type: "task".to_string(),
            responded_by: None,
            selected: None,
        }
    }

    #[test]
    fn empty_matcher_matches_everything() {
        assert!(Matcher::new().matches(&event()));
    }

    #[test]
    fn sugar_flags_compose_as_and() {
        let matcher = Matcher::new().issue("bd-1").until_status("closed");
        assert!(matcher.matches(&event()));
        let mismatched = Matcher::new().issue("bd-2").until_status("closed");
        assert!(!mismatched.matches(&event()));
    }

    #[test]
    fn parse_compact_string_with_mixed_ops() {
        let matcher = Matcher::parse("issue=bd-1,title~=thing");
        assert!(matcher.matches(&event()));
        let matcher = Matcher::parse("issue=bd-1,title~=nope");
        assert!(!matcher.matches(&event()));
    }

    #[test]
    fn contains_op_checks_substring() {
        let matcher = Matcher::new().with("issue_type", MatchOp::Contains, "ask");
        assert!(matcher.matches(&event()));
    }
}
