use thiserror::Error;

/// Errors a gate can raise before it has a chance to translate a failure
/// into an [`crate::envelope::Envelope`]. Most gate outcomes are NOT errors —
/// a policy violation is a normal `Envelope{ok: false, ...}` return value.
/// This type covers the inputs/plumbing failures that precede policy
/// evaluation.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] beads_storage::StorageError),

    #[error(transparent)]
    Router(#[from] beads_query::RouterError),

    #[error(transparent)]
    Git(#[from] beads_git::commands::GitError),
}

pub type Result<T> = std::result::Result<T, FlowError>;
