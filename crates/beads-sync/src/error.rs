use thiserror::Error;

/// Errors produced by the sync engine (export/import/debounce).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lock error: {0}")]
    Lock(#[from] beads_lockfile::LockError),

    #[error("storage error: {0}")]
    Storage(#[from] beads_storage::StorageError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
