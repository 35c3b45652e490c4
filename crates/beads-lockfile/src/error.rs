use std::time::Duration;

use thiserror::Error;

/// Errors produced while acquiring or holding the replica lock.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    #[error("lock io error: {0}")]
    Io(String),
}
