use thiserror::Error;

/// Errors produced by the router while resolving ids and routes.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid id: empty")]
    InvalidInput,

    #[error("ambiguous id prefix {prefix:?}: candidates {candidates:?}")]
    Ambiguous {
        prefix: String,
        candidates: Vec<String>,
    },

    #[error("no issue found matching {0:?}")]
    NotFound(String),

    #[error("route io error: {0}")]
    Io(String),

    #[error("storage error: {0}")]
    Storage(#[from] beads_storage::StorageError),
}
