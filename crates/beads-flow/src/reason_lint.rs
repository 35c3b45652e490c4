//! `lintCloseReason` — a deterministic keyword lint, not free-text analysis.

use beads_core::dependency::FAILURE_CLOSE_KEYWORDS;

/// Fillers that read as a close but carry no evidence of what actually
/// happened. Same substring-matching idiom as [`FAILURE_CLOSE_KEYWORDS`].
const UNSAFE_FILLER_KEYWORDS: &[&str] = &[
    "fixed error handling path",
    "done",
    "fixed it",
    "works now",
    "should be fine",
    "looks good",
    "n/a",
];

/// Verbs whose presence signals an outcome was actually stated.
const OUTCOME_VERBS: &[&str] = &[
    "implemented", "fixed", "added", "removed", "refactored", "migrated",
    "resolved", "merged", "verified", "closed", "completed", "updated",
    "deprecated", "replaced",
];

/// Reasons must also point at evidence the outcome happened, not just name
/// an action.
const EVIDENCE_MARKERS: &[&str] = &[
    "test", "verified", "confirmed", "passing", "passed", "pr ", "commit",
    "reviewed", "checked", "validated", "see ", "ci ",
];

/// Why a close reason was rejected. `Ok(())` means the reason is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintFailure {
    Empty,
    UnacknowledgedFailure,
    UnsafeFiller(&'static str),
    NoOutcomeOrEvidence,
}

impl std::fmt::Display for LintFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "close reason is empty"),
            Self::UnacknowledgedFailure => write!(
                f,
                "reason begins with 'failed:' but failure reasons are not allowed here"
            ),
            Self::UnsafeFiller(kw) => write!(f, "reason reads as an unsafe filler ({kw:?})"),
            Self::NoOutcomeOrEvidence => write!(
                f,
                "reason does not state an outcome with supporting evidence"
            ),
        }
    }
}

/// Validates a close reason against the shared policy.
///
/// - Empty reasons are always invalid.
/// - A `failed:`-prefixed reason (case-insensitive) is valid only when
///   `allow_failure_reason` is set by the caller.
/// - Reasons containing a configured filler phrase are invalid.
/// - Otherwise a reason must mention an outcome verb and an evidence marker.
pub fn lint_close_reason(reason: &str, allow_failure_reason: bool) -> Result<(), LintFailure> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(LintFailure::Empty);
    }

    let lower = trimmed.to_lowercase();
    if lower.starts_with("failed:") && !allow_failure_reason {
        return Err(LintFailure::UnacknowledgedFailure);
    }

    for kw in UNSAFE_FILLER_KEYWORDS {
        if lower.contains(kw) {
            return Err(LintFailure::UnsafeFiller(kw));
        }
    }

    let has_outcome = OUTCOME_VERBS.iter().any(|v| lower.contains(v))
        || (lower.starts_with("failed:") && FAILURE_CLOSE_KEYWORDS.iter().any(|k| lower.contains(k)));
    let has_evidence = EVIDENCE_MARKERS.iter().any(|e| lower.contains(e));

    if has_outcome && has_evidence {
        Ok(())
    } else {
        Err(LintFailure::NoOutcomeOrEvidence)
    }
}
