//! Enum types for the beads system.
//!
//! Each enum has:
//! - Custom Serialize (as snake_case string)
//! - Custom Deserialize (known variants + catch-all Custom/Other(String))
//! - `as_str()`, `is_default()`, `Display` impl

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: defines an enum with known string variants + a Custom(String) fallback.
// ---------------------------------------------------------------------------
macro_rules! define_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }

            /// Returns `true` if this is a known valid variant or any non-empty custom string.
            pub fn is_valid(&self) -> bool {
                match self {
                    Self::$custom_variant(s) => !s.is_empty(),
                    _ => true,
                }
            }

            /// Returns `true` if this is valid, also accepting the given custom values.
            pub fn is_valid_with_custom(&self, custom_values: &[&str]) -> bool {
                if self.is_builtin() {
                    return true;
                }
                if let Self::$custom_variant(s) = self {
                    return custom_values.contains(&s.as_str());
                }
                false
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                // Check known variants first to avoid allocation in common case.
                match s.as_str() {
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro variant for enums that use an empty-string "None" default.
// ---------------------------------------------------------------------------
macro_rules! define_enum_with_none {
    (
        $(#[$meta:meta])*
        $name:ident, custom_variant = $custom_variant:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            /// Empty / unset.
            None,
            $( $variant, )+
            $custom_variant(String),
        }

        impl $name {
            /// Returns the string representation.
            pub fn as_str(&self) -> &str {
                match self {
                    Self::None => "",
                    $( Self::$variant => $str, )+
                    Self::$custom_variant(s) => s.as_str(),
                }
            }

            /// Returns `true` if this is the default variant (None).
            pub fn is_default(&self) -> bool {
                *self == Self::None
            }

            /// Returns `true` if this is a built-in (non-custom) variant.
            pub fn is_builtin(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }

            /// Returns `true` if this is a known valid variant (including None).
            pub fn is_valid(&self) -> bool {
                !matches!(self, Self::$custom_variant(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::None
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s.as_str()))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    "" => Self::None,
                    $( $str => Self::$variant, )+
                    other => Self::$custom_variant(other.to_owned()),
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    "" => Self::None,
                    $( $str => Self::$variant, )+
                    _ => Self::$custom_variant(s),
                }
            }
        }
    };
}

// ===========================================================================
// Status
// ===========================================================================

define_enum! {
    /// Current state of an issue.
    Status, default = Open, custom_variant = Custom,
    variants: [
        (Open, "open"),
        (InProgress, "in_progress"),
        (Blocked, "blocked"),
        (Hooked, "hooked"),
        (Pinned, "pinned"),
        (Closed, "closed"),
        (Tombstone, "tombstone"),
    ]
}

impl Status {
    /// Returns `true` for the statuses that represent a closed/terminal state
    /// for the purposes of dependency resolution (`GetReadyWork`).
    pub fn is_closed_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Tombstone)
    }

    /// Returns `true` for the WIP statuses an actor may hold at most one of.
    pub fn is_active_wip(&self) -> bool {
        matches!(self, Self::InProgress | Self::Hooked)
    }
}

// ===========================================================================
// IssueType
// ===========================================================================

define_enum! {
    /// Categorises the kind of work.
    IssueType, default = Task, custom_variant = Custom,
    variants: [
        (Bug, "bug"),
        (Feature, "feature"),
        (Task, "task"),
        (Epic, "epic"),
        (Chore, "chore"),
        (Decision, "decision"),
        (Advice, "advice"),
        (Skill, "skill"),
        (Agent, "agent"),
        (Gate, "gate"),
    ]
}

impl IssueType {
    /// Normalises aliases to their canonical form.
    pub fn normalize(&self) -> Self {
        match self.as_str() {
            "enhancement" | "feat" => Self::Feature,
            "dec" | "adr" => Self::Decision,
            _ => self.clone(),
        }
    }
}

// ===========================================================================
// DependencyType
// ===========================================================================

define_enum! {
    /// Relationship type between issues.
    DependencyType, default = Blocks, custom_variant = Custom,
    variants: [
        (Blocks, "blocks"),
        (ParentChild, "parent-child"),
        (DiscoveredFrom, "discovered-from"),
        (ProvidesSkill, "provides-skill"),
        (RequiresSkill, "requires-skill"),
        (Related, "related"),
    ]
}

impl DependencyType {
    /// Returns `true` if this dependency type blocks work (affects ready calculation).
    pub fn affects_ready_work(&self) -> bool {
        matches!(self, Self::Blocks)
    }

    /// Returns `true` if this type is considered for cycle detection
    /// (the `blocks`/`parent-child` subgraph named by `DetectCycles`).
    pub fn is_cycle_checked(&self) -> bool {
        matches!(self, Self::Blocks | Self::ParentChild)
    }

    /// Returns `true` if this is a well-known built-in dependency type.
    pub fn is_well_known(&self) -> bool {
        self.is_builtin()
    }
}

// ===========================================================================
// AgentState
// ===========================================================================

define_enum_with_none! {
    /// Self-reported state of an agent (agent sub-record on an `agent`-type issue).
    AgentState, custom_variant = Custom,
    variants: [
        (Idle, "idle"),
        (Spawning, "spawning"),
        (Running, "running"),
        (Working, "working"),
        (Stuck, "stuck"),
        (Done, "done"),
        (Stopped, "stopped"),
        (Dead, "dead"),
    ]
}

// ===========================================================================
// AdviceTrigger / AdviceOnFailure
// ===========================================================================

define_enum! {
    /// When an advice hook fires.
    AdviceTrigger, default = SessionEnd, custom_variant = Custom,
    variants: [
        (SessionEnd, "session-end"),
        (BeforeCommit, "before-commit"),
        (BeforePush, "before-push"),
        (BeforeHandoff, "before-handoff"),
    ]
}

impl AdviceTrigger {
    /// Returns `true` for one of the four enumerated trigger values (case-sensitive).
    pub fn is_enumerated(&self) -> bool {
        self.is_builtin()
    }
}

define_enum! {
    /// What to do when an advice hook fails.
    AdviceOnFailure, default = Warn, custom_variant = Custom,
    variants: [
        (Block, "block"),
        (Warn, "warn"),
        (Ignore, "ignore"),
    ]
}

impl AdviceOnFailure {
    pub fn is_enumerated(&self) -> bool {
        self.is_builtin()
    }
}

// ===========================================================================
// SortPolicy
// ===========================================================================

define_enum! {
    /// Determines how ready work is ordered.
    SortPolicy, default = Hybrid, custom_variant = Custom,
    variants: [
        (Hybrid, "hybrid"),
        (Priority, "priority"),
        (Oldest, "oldest"),
    ]
}

// ===========================================================================
// EventType (audit trail taxonomy)
// ===========================================================================

/// Categorises audit trail events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    Created,
    Updated,
    StatusChanged,
    Commented,
    Closed,
    Reopened,
    DependencyAdded,
    DependencyRemoved,
    LabelAdded,
    LabelRemoved,
    DecisionResponded,
    /// Catch-all for unknown / future event types.
    Other(String),
}

impl EventType {
    /// Returns the string representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::StatusChanged => "status_changed",
            Self::Commented => "commented",
            Self::Closed => "closed",
            Self::Reopened => "reopened",
            Self::DependencyAdded => "dependency_added",
            Self::DependencyRemoved => "dependency_removed",
            Self::LabelAdded => "label_added",
            Self::LabelRemoved => "label_removed",
            Self::DecisionResponded => "decision_responded",
            Self::Other(s) => s.as_str(),
        }
    }

    /// Returns `true` if this is the default variant.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Created)
    }

    /// Maps an audit event to the SSE mutation-stream `Type` taxonomy
    /// (`create, update, delete, decision_responded, ...`).
    pub fn as_sse_type(&self) -> &str {
        match self {
            Self::Created => "create",
            Self::Updated | Self::StatusChanged | Self::Commented | Self::LabelAdded
            | Self::LabelRemoved | Self::DependencyAdded | Self::DependencyRemoved => "update",
            Self::Closed => "update",
            Self::Reopened => "update",
            Self::DecisionResponded => "decision_responded",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl Default for EventType {
    fn default() -> Self {
        Self::Created
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        match s {
            "created" => Self::Created,
            "updated" => Self::Updated,
            "status_changed" => Self::StatusChanged,
            "commented" => Self::Commented,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            "dependency_added" => Self::DependencyAdded,
            "dependency_removed" => Self::DependencyRemoved,
            "label_added" => Self::LabelAdded,
            "label_removed" => Self::LabelRemoved,
            "decision_responded" => Self::DecisionResponded,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for EventType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_default_is_open() {
        assert_eq!(Status::default(), Status::Open);
        assert!(Status::Open.is_default());
        assert!(!Status::Closed.is_default());
    }

    #[test]
    fn status_roundtrip_serde() {
        let s = Status::InProgress;
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#""in_progress""#);
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn status_tombstone_is_closed_terminal() {
        assert!(Status::Tombstone.is_closed_terminal());
        assert!(Status::Closed.is_closed_terminal());
        assert!(!Status::Open.is_closed_terminal());
    }

    #[test]
    fn status_custom_roundtrip() {
        let json = r#""my_custom_status""#;
        let s: Status = serde_json::from_str(json).unwrap();
        assert_eq!(s, Status::Custom("my_custom_status".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), json);
    }

    #[test]
    fn dependency_type_as_str() {
        assert_eq!(DependencyType::ParentChild.as_str(), "parent-child");
        assert_eq!(
            DependencyType::ProvidesSkill.as_str(),
            "provides-skill"
        );
    }

    #[test]
    fn dependency_type_affects_ready_work() {
        assert!(DependencyType::Blocks.affects_ready_work());
        assert!(!DependencyType::ParentChild.affects_ready_work());
        assert!(!DependencyType::Related.affects_ready_work());
    }

    #[test]
    fn dependency_type_cycle_checked() {
        assert!(DependencyType::Blocks.is_cycle_checked());
        assert!(DependencyType::ParentChild.is_cycle_checked());
        assert!(!DependencyType::Related.is_cycle_checked());
    }

    #[test]
    fn agent_state_none_default() {
        assert_eq!(AgentState::default(), AgentState::None);
        assert!(AgentState::None.is_default());
        assert_eq!(AgentState::None.as_str(), "");
    }

    #[test]
    fn agent_state_roundtrip() {
        let s = AgentState::Running;
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#""running""#);
        let back: AgentState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn event_type_other_variant() {
        let json = r#""custom_event""#;
        let e: EventType = serde_json::from_str(json).unwrap();
        assert_eq!(e, EventType::Other("custom_event".into()));
    }

    #[test]
    fn event_type_sse_mapping() {
        assert_eq!(EventType::Created.as_sse_type(), "create");
        assert_eq!(EventType::StatusChanged.as_sse_type(), "update");
        assert_eq!(EventType::DecisionResponded.as_sse_type(), "decision_responded");
    }

    #[test]
    fn issue_type_normalize() {
        assert_eq!(
            IssueType::Custom("enhancement".into()).normalize(),
            IssueType::Feature
        );
        assert_eq!(
            IssueType::Custom("feat".into()).normalize(),
            IssueType::Feature
        );
        assert_eq!(
            IssueType::Custom("adr".into()).normalize(),
            IssueType::Decision
        );
        assert_eq!(IssueType::Bug.normalize(), IssueType::Bug);
    }

    #[test]
    fn advice_trigger_enumerated_values() {
        assert!(AdviceTrigger::SessionEnd.is_enumerated());
        assert!(AdviceTrigger::BeforeHandoff.is_enumerated());
        assert!(!AdviceTrigger::Custom("Session-End".into()).is_enumerated());
    }

    #[test]
    fn advice_on_failure_default_is_warn() {
        assert_eq!(AdviceOnFailure::default(), AdviceOnFailure::Warn);
    }

    #[test]
    fn sort_policy_default() {
        assert_eq!(SortPolicy::default(), SortPolicy::Hybrid);
    }
}
