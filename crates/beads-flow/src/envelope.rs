//! The command envelope every gate returns: a machine-readable outcome plus
//! the process exit code a CLI or daemon RPC handler should surface.

use beads_core::comment::Event;
use serde::Serialize;
use serde_json::Value;

/// Exit-code class a gate outcome maps to. Kept separate from the numeric
/// code so gate logic reads as "this was a policy violation" rather than
/// "this was a 3".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitClass {
    /// 0 — includes "no work" and "check passed" outcomes.
    Success,
    /// 1 — invalid input or an unexpected system error.
    SystemError,
    /// 3 — a gate that a caller could remediate deterministically.
    PolicyViolation,
    /// A dedicated code for operations whose primary entity succeeded but
    /// secondary work (label apply, dependency add) failed.
    PartialState,
}

impl ExitClass {
    pub fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::SystemError => 1,
            Self::PolicyViolation => 3,
            Self::PartialState => 4,
        }
    }
}

/// `{OK, Command, Result, IssueID, Details{...}, Events[], RecoveryCommand?}`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub ok: bool,
    pub command: String,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_command: Option<String>,
    #[serde(skip)]
    pub exit_class: ExitClass,
}

impl Envelope {
    pub fn new(command: impl Into<String>, result: impl Into<String>, exit_class: ExitClass) -> Self {
        Self {
            ok: exit_class == ExitClass::Success,
            command: command.into(),
            result: result.into(),
            issue_id: None,
            details: Value::Null,
            events: Vec::new(),
            recovery_command: None,
            exit_class,
        }
    }

    pub fn success(command: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(command, result, ExitClass::Success)
    }

    pub fn policy_violation(command: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(command, result, ExitClass::PolicyViolation)
    }

    pub fn system_error(command: impl Into<String>, result: impl Into<String>) -> Self {
        Self::new(command, result, ExitClass::SystemError)
    }

    pub fn partial_state(
        command: impl Into<String>,
        result: impl Into<String>,
        recovery_command: impl Into<String>,
    ) -> Self {
        let mut env = Self::new(command, result, ExitClass::PartialState);
        env.recovery_command = Some(recovery_command.into());
        env
    }

    pub fn with_issue_id(mut self, id: impl Into<String>) -> Self {
        self.issue_id = Some(id.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_class.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_has_zero_exit_code_and_ok_true() {
        let env = Envelope::success("claim-next", "claimed").with_issue_id("bd-abc");
        assert!(env.ok);
        assert_eq!(env.exit_code(), 0);
        assert_eq!(env.issue_id.as_deref(), Some("bd-abc"));
    }

    #[test]
    fn policy_violation_has_dedicated_exit_code_and_ok_false() {
        let env = Envelope::policy_violation("close-safe", "policy_violation");
        assert!(!env.ok);
        assert_eq!(env.exit_code(), 3);
    }

    #[test]
    fn partial_state_carries_recovery_command() {
        let env = Envelope::partial_state(
            "create-discovered",
            "partial_state",
            "bd label add bd-abc missing-label",
        );
        assert_eq!(env.exit_code(), 4);
        assert_eq!(
            env.recovery_command.as_deref(),
            Some("bd label add bd-abc missing-label")
        );
    }

    #[test]
    fn envelope_serializes_without_null_optional_fields() {
        let env = Envelope::success("resume", "no_wip");
        let json = serde_json::to_value(&env).unwrap();
        assert!(json.get("issue_id").is_none());
        assert!(json.get("recovery_command").is_none());
        assert!(json.get("events").is_none());
    }
}
