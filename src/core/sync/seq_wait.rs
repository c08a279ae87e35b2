/*!
 * Sequence Acknowledgement Wait
 *
 * Blocks callers until an acknowledged sequence number catches up with a
 * requested one. Built on `parking_lot::Condvar`; the predicate is checked
 * under the same mutex that `acknowledge` updates, so a wake between the
 * check and the park can't be lost.
 *
 * This mutex is private to the wait and never one of the record locks, so a
 * blocked thread holds nothing the rest of the core needs.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Result type for wait operations
pub type WaitResult<T> = Result<T, WaitError>;

/// Wait operation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait operation timed out (requested {requested}, acknowledged {acknowledged})")]
    Timeout { requested: u64, acknowledged: u64 },
}

#[derive(Debug, Default, Clone, Copy)]
struct SeqPair {
    requested: u64,
    acknowledged: u64,
}

/// Requested/acknowledged sequence pair with a blocking wait
#[derive(Debug, Default)]
pub struct SeqWait {
    state: Mutex<SeqPair>,
    condvar: Condvar,
    waiters: AtomicUsize,
}

impl SeqWait {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn requested(&self) -> u64 {
        self.state.lock().requested
    }

    #[inline]
    pub fn acknowledged(&self) -> u64 {
        self.state.lock().acknowledged
    }

    /// Both values from one critical section
    #[inline]
    pub fn pair(&self) -> (u64, u64) {
        let state = self.state.lock();
        (state.requested, state.acknowledged)
    }

    /// Record a newly issued requested sequence
    ///
    /// Never moves the requested value backwards.
    pub fn set_requested(&self, seq: u64) {
        let mut state = self.state.lock();
        if seq > state.requested {
            state.requested = seq;
        }
    }

    /// Raise the acknowledged sequence to at least `seq` and wake waiters
    ///
    /// Returns the acknowledged value after the update.
    pub fn acknowledge(&self, seq: u64) -> u64 {
        let acknowledged = {
            let mut state = self.state.lock();
            state.acknowledged = state.acknowledged.max(seq);
            state.acknowledged
        };
        if self.waiters.load(Ordering::Acquire) > 0 {
            self.condvar.notify_all();
        }
        acknowledged
    }

    /// Whether the acknowledgement has caught up with the request
    #[inline]
    pub fn is_caught_up(&self) -> bool {
        let state = self.state.lock();
        state.acknowledged >= state.requested
    }

    /// Block until `acknowledged >= requested` or `timeout` elapses
    ///
    /// Returns immediately when already caught up. The waiter count is raised
    /// for the whole duration of the blocking section.
    pub fn wait_caught_up(&self, timeout: Duration) -> WaitResult<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        if state.acknowledged >= state.requested {
            return Ok(());
        }

        self.waiters.fetch_add(1, Ordering::AcqRel);
        let outcome = loop {
            if state.acknowledged >= state.requested {
                break Ok(());
            }
            let timed_out = match deadline {
                Some(deadline) => self.condvar.wait_until(&mut state, deadline).timed_out(),
                None => {
                    self.condvar.wait(&mut state);
                    false
                }
            };
            if timed_out && state.acknowledged < state.requested {
                break Err(WaitError::Timeout {
                    requested: state.requested,
                    acknowledged: state.acknowledged,
                });
            }
        };
        self.waiters.fetch_sub(1, Ordering::AcqRel);
        outcome
    }

    /// Number of threads currently blocked in [`wait_caught_up`](Self::wait_caught_up)
    #[inline]
    pub fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_caught_up_returns_immediately() {
        let wait = SeqWait::new();
        wait.set_requested(3);
        wait.acknowledge(5);
        let start = Instant::now();
        assert!(wait.wait_caught_up(Duration::from_secs(5)).is_ok());
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(wait.waiter_count(), 0);
    }

    #[test]
    fn test_timeout_reports_both_values() {
        let wait = SeqWait::new();
        wait.set_requested(2);
        let result = wait.wait_caught_up(Duration::from_millis(30));
        assert_eq!(
            result,
            Err(WaitError::Timeout {
                requested: 2,
                acknowledged: 0
            })
        );
        assert_eq!(wait.waiter_count(), 0);
    }

    #[test]
    fn test_acknowledge_wakes_waiter() {
        let wait = Arc::new(SeqWait::new());
        wait.set_requested(1);

        let wait_clone = Arc::clone(&wait);
        let handle = thread::spawn(move || wait_clone.wait_caught_up(Duration::from_secs(5)));

        while wait.waiter_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        wait.acknowledge(1);

        assert!(handle.join().unwrap().is_ok());
        assert_eq!(wait.waiter_count(), 0);
    }

    #[test]
    fn test_acknowledge_never_regresses() {
        let wait = SeqWait::new();
        assert_eq!(wait.acknowledge(9), 9);
        assert_eq!(wait.acknowledge(4), 9);
        wait.set_requested(6);
        wait.set_requested(2);
        assert_eq!(wait.pair(), (6, 9));
    }
}
