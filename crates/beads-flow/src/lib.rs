//! Deterministic workflow gates: claim, close, block, land, resume, and
//! intake reconciliation, each producing a structured command envelope.

pub mod envelope;
pub mod error;
pub mod gates;
pub mod reason_lint;
pub mod runner;

pub use envelope::{Envelope, ExitClass};
pub use error::{FlowError, Result};
pub use gates::*;
pub use reason_lint::{lint_close_reason, LintFailure};
pub use runner::{ProcessRunner, RunOutput, Runner};
