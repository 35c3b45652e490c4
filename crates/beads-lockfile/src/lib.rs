//! Advisory exclusive file locking for the beads replica.
//!
//! The lock is a sibling file next to the text replica (conventionally
//! `.sync.lock`). It coordinates concurrent export/import across processes;
//! intra-process callers must serialize themselves (see `beads-sync`'s
//! debouncer, which owns a single exporter task).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

mod error;

pub use error::LockError;

/// Interval between poll attempts while waiting for a contended lock.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A held exclusive lock on a file. Released when dropped.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Acquires an exclusive lock on `path`, creating the file if needed.
    ///
    /// `timeout = Duration::ZERO` means "try once and fail immediately" if
    /// contended. Otherwise polls at [`POLL_INTERVAL`] until the lock is
    /// acquired or `timeout` elapses, in which case the error message
    /// contains the exact configured duration (`"timeout after {timeout:?}"`).
    pub fn acquire_exclusive(path: impl AsRef<Path>, timeout: Duration) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::Io(format!("open {}: {e}", path.display())))?;

        if timeout.is_zero() {
            return match file.try_lock_exclusive() {
                Ok(()) => Ok(Self { file, path }),
                Err(_) => Err(LockError::Timeout(timeout)),
            };
        }

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { file, path }),
                Err(_) => {
                    if Instant::now() >= deadline {
                        return Err(LockError::Timeout(timeout));
                    }
                    std::thread::sleep(POLL_INTERVAL.min(deadline - Instant::now()));
                }
            }
        }
    }

    /// Path of the locked file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn acquires_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sync.lock");

        let lock = FileLock::acquire_exclusive(&path, Duration::from_millis(100)).unwrap();
        assert_eq!(lock.path(), path);
        drop(lock);

        // Re-acquire after drop must succeed immediately.
        let _lock2 = FileLock::acquire_exclusive(&path, Duration::ZERO).unwrap();
    }

    #[test]
    fn zero_timeout_fails_immediately_on_contention() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sync.lock");

        let _held = FileLock::acquire_exclusive(&path, Duration::ZERO).unwrap();

        let start = Instant::now();
        let err = FileLock::acquire_exclusive(&path, Duration::ZERO).unwrap_err();
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(matches!(err, LockError::Timeout(d) if d.is_zero()));
    }

    #[test]
    fn timeout_message_contains_configured_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sync.lock");
        let _held = FileLock::acquire_exclusive(&path, Duration::ZERO).unwrap();

        let timeout = Duration::from_millis(80);
        let err = FileLock::acquire_exclusive(&path, timeout).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("timeout after"));
        assert!(msg.contains(&format!("{timeout:?}")));
    }

    #[test]
    fn contended_lock_released_by_other_thread_unblocks_waiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sync.lock");
        let barrier = Arc::new(Barrier::new(2));

        let held = FileLock::acquire_exclusive(&path, Duration::ZERO).unwrap();

        let path2 = path.clone();
        let barrier2 = barrier.clone();
        let handle = std::thread::spawn(move || {
            barrier2.wait();
            std::thread::sleep(Duration::from_millis(50));
            drop(held);
        });

        barrier.wait();
        let lock = FileLock::acquire_exclusive(&path2, Duration::from_secs(2)).unwrap();
        handle.join().unwrap();
        drop(lock);
    }
}
