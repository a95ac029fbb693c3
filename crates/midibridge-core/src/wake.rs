//! Wake signal letting the application thread sleep on an empty queue.
//!
//! Only the consumer ever locks the mutex. The realtime producer calls
//! [`WakeSignal::notify`], which touches the condition variable alone and
//! never waits. A notification that lands between the consumer's emptiness
//! check and its park is not seen, so the consumer waits in bounded slices
//! and re-checks after each one.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Default upper bound on one wait slice.
pub const DEFAULT_WAKE_POLL_INTERVAL: Duration = Duration::from_millis(10);

const MIN_POLL_INTERVAL: Duration = Duration::from_micros(100);

#[derive(Debug)]
pub struct WakeSignal {
    lock: Mutex<()>,
    cond: Condvar,
    poll_interval: Duration,
}

impl WakeSignal {
    /// Signal whose waiters re-check at least every `poll_interval` (minimum 100µs).
    pub fn new(poll_interval: Duration) -> Self {
        if poll_interval < MIN_POLL_INTERVAL {
            tracing::debug!(
                "Wake poll interval {:?} raised to {:?}",
                poll_interval,
                MIN_POLL_INTERVAL
            );
        }
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Longest single sleep of a waiter.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Wake the waiting consumer, if any. RT-safe: no mutex, no wait.
    #[inline]
    pub fn notify(&self) {
        self.cond.notify_one();
    }

    /// Block until `has_data` returns true.
    ///
    /// The predicate is evaluated before parking and after every wake-up,
    /// spurious or not, so this never returns while it is false.
    pub fn wait_for_data(&self, mut has_data: impl FnMut() -> bool) {
        if has_data() {
            return;
        }
        let mut guard = self.lock.lock();
        while !has_data() {
            self.cond.wait_for(&mut guard, self.poll_interval);
        }
    }

    /// Like [`wait_for_data`](Self::wait_for_data) but gives up at `timeout`.
    ///
    /// Returns the final value of the predicate. A timeout too large to
    /// represent as a deadline waits without one.
    pub fn wait_for_data_timeout(
        &self,
        mut has_data: impl FnMut() -> bool,
        timeout: Duration,
    ) -> bool {
        if has_data() {
            return true;
        }
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait_for_data(has_data);
            return true;
        };
        let mut guard = self.lock.lock();
        loop {
            if has_data() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let slice = (deadline - now).min(self.poll_interval);
            self.cond.wait_for(&mut guard, slice);
        }
    }
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new(DEFAULT_WAKE_POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_returns_immediately_when_ready() {
        let signal = WakeSignal::default();
        signal.wait_for_data(|| true);
        assert!(signal.wait_for_data_timeout(|| true, Duration::ZERO));
    }

    #[test]
    fn test_timeout_expires_without_data() {
        let signal = WakeSignal::new(Duration::from_millis(5));
        let start = Instant::now();
        assert!(!signal.wait_for_data_timeout(|| false, Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_notify_wakes_waiter() {
        // Long poll interval so the wake has to come from notify()
        let signal = Arc::new(WakeSignal::new(Duration::from_secs(5)));
        let ready = Arc::new(AtomicBool::new(false));

        let waiter = {
            let signal = Arc::clone(&signal);
            let ready = Arc::clone(&ready);
            std::thread::spawn(move || {
                let start = Instant::now();
                signal.wait_for_data(|| ready.load(Ordering::Acquire));
                start.elapsed()
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        ready.store(true, Ordering::Release);
        signal.notify();

        let waited = waiter.join().unwrap();
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_unrepresentable_timeout_waits_for_data() {
        let signal = Arc::new(WakeSignal::new(Duration::from_millis(5)));
        let ready = Arc::new(AtomicBool::new(false));

        let waiter = {
            let signal = Arc::clone(&signal);
            let ready = Arc::clone(&ready);
            std::thread::spawn(move || {
                signal.wait_for_data_timeout(|| ready.load(Ordering::Acquire), Duration::MAX)
            })
        };

        std::thread::sleep(Duration::from_millis(20));
        ready.store(true, Ordering::Release);
        signal.notify();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_missed_notify_recovers_by_polling() {
        let signal = Arc::new(WakeSignal::new(Duration::from_millis(5)));
        let ready = Arc::new(AtomicBool::new(false));

        let waiter = {
            let signal = Arc::clone(&signal);
            let ready = Arc::clone(&ready);
            std::thread::spawn(move || signal.wait_for_data(|| ready.load(Ordering::Acquire)))
        };

        std::thread::sleep(Duration::from_millis(20));
        // Data appears without any notify at all
        ready.store(true, Ordering::Release);
        waiter.join().unwrap();
    }
}
