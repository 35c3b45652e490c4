//! Coalesces bursts of "dirty" triggers into a single deferred action.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Debounces repeated `trigger()` calls into at most one invocation of the
/// wrapped action per window. A trigger arriving while a timer is already
/// pending resets the window; the sequence counter ensures a superseded
/// timer callback becomes a no-op even if it fires after a newer trigger
/// reset the window.
pub struct Debouncer {
    window: Duration,
    action: Arc<dyn Fn() + Send + Sync>,
    sequence: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            window,
            action: Arc::new(action),
            sequence: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Registers a dirty event. Spawns (or reschedules) the deferred action.
    pub fn trigger(&self) {
        let my_seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let sequence = self.sequence.clone();
        let action = self.action.clone();
        let window = self.window;

        let handle = std::thread::spawn(move || {
            std::thread::sleep(window);
            // A later trigger bumped the sequence past ours: stale, no-op.
            if sequence.load(Ordering::SeqCst) == my_seq {
                action();
            }
        });

        let mut pending = self.pending.lock().unwrap();
        *pending = Some(handle);
    }

    /// Cancels any pending timer and blocks until the in-flight action (if
    /// one was already running) has finished. Used during shutdown.
    pub fn cancel_and_wait(&self) {
        // Bumping the sequence invalidates any timer that hasn't fired yet.
        self.sequence.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pending.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[test]
    fn bursts_within_window_trigger_action_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let debouncer = Debouncer::new(Duration::from_millis(40), move || {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        for _ in 0..5 {
            debouncer.trigger();
            std::thread::sleep(Duration::from_millis(5));
        }
        debouncer.cancel_and_wait();
        std::thread::sleep(Duration::from_millis(60));

        // cancel_and_wait invalidated the last pending timer before it could
        // fire, so the action should not have run at all here.
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn trigger_without_cancel_eventually_fires_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        let debouncer = Debouncer::new(Duration::from_millis(20), move || {
            count2.fetch_add(1, Ordering::SeqCst);
        });

        let start = Instant::now();
        for _ in 0..5 {
            debouncer.trigger();
        }
        while count.load(Ordering::SeqCst) == 0 && start.elapsed() < Duration::from_secs(1) {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
