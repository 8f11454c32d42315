use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Clonable cancellation handle shared between the capture thread,
/// the ctrl-c handler, and the session coordinator.
#[derive(Debug, Clone, Default)]
pub struct SignalOfStop {
    shared: Arc<SharedState>,
}

#[derive(Debug, Default)]
struct SharedState {
    closing: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl SignalOfStop {
    pub fn new() -> SignalOfStop {
        SignalOfStop::default()
    }

    pub fn cancel(&self) {
        self.shared.closing.store(true, Ordering::Relaxed);

        // Lock briefly to synchronize with threads about to wait
        let _guard = self.shared.mutex.lock().unwrap();
        self.shared.condvar.notify_all();
    }

    pub fn cancelled(&self) -> bool {
        self.shared.closing.load(Ordering::Relaxed)
    }

    /// Sleep for `timeout`, waking early on cancellation.
    /// Returns true if the signal was cancelled before the timeout elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.shared.mutex.lock().unwrap();

        while !self.cancelled() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (g, result) = self
                .shared
                .condvar
                .wait_timeout(guard, deadline - now)
                .unwrap();
            guard = g;
            if result.timed_out() {
                return self.cancelled();
            }
        }
        true
    }
}
