//! Deadline-based polling. Every "wait until" operation in the daemon goes
//! through this one primitive.

use std::thread;
use std::time::{Duration, Instant};

use crate::error::SessionError;

pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }

    /// Polls `probe` until it yields a value or the deadline passes.
    ///
    /// `Ok(None)` from the probe means "not yet". `Ok(None)` from this
    /// function means the deadline passed; the caller decides what timing
    /// out means. Probe errors propagate immediately. The probe always runs
    /// at least once, even with a zero timeout, and the final sleep never
    /// overshoots the deadline.
    pub fn poll_until<T, F>(&self, mut probe: F) -> Result<Option<T>, SessionError>
    where
        F: FnMut() -> Result<Option<T>, SessionError>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(found) = probe()? {
                return Ok(Some(found));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiter(timeout_ms: u64, poll_ms: u64) -> Waiter {
        Waiter::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_ms),
        )
    }

    #[test]
    fn test_immediate_success_polls_once() {
        let mut calls = 0;
        let found = waiter(200, 10)
            .poll_until(|| {
                calls += 1;
                Ok(Some(42))
            })
            .unwrap();
        assert_eq!(found, Some(42));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_eventual_success() {
        let mut calls = 0;
        let found = waiter(1000, 5)
            .poll_until(|| {
                calls += 1;
                Ok((calls >= 3).then_some("done"))
            })
            .unwrap();
        assert_eq!(found, Some("done"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_deadline_returns_none() {
        let found: Option<()> = waiter(30, 5).poll_until(|| Ok(None)).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_zero_timeout_still_probes_once() {
        let mut calls = 0;
        let found: Option<()> = waiter(0, 5)
            .poll_until(|| {
                calls += 1;
                Ok(None)
            })
            .unwrap();
        assert!(found.is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_probe_error_propagates() {
        let result: Result<Option<()>, _> = waiter(200, 5).poll_until(|| {
            Err(SessionError::ElementNotFound("#gone".to_string()))
        });
        assert!(result.is_err());
    }
}
