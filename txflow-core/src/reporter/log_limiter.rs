//! Failure log limiter
//!
//! A dead price engine would otherwise produce one error line per completed
//! trade. Only failures among the first `max_logged` occurrences are logged,
//! and never two within `cooldown` of each other.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FailureLogLimiter {
    max_logged: u32,
    cooldown: Duration,
    failures: u64,
    logged: u32,
    last_logged: Option<Instant>,
}

impl FailureLogLimiter {
    pub fn new(max_logged: u32, cooldown: Duration) -> Self {
        Self {
            max_logged,
            cooldown,
            failures: 0,
            logged: 0,
            last_logged: None,
        }
    }

    /// Whether a failure occurring at `now` should be logged
    ///
    /// Every call counts as one failure. Records the log when it returns
    /// true.
    pub fn should_log(&mut self, now: Instant) -> bool {
        self.failures = self.failures.saturating_add(1);
        if self.failures > u64::from(self.max_logged) {
            return false;
        }

        if let Some(last) = self.last_logged {
            if now.saturating_duration_since(last) < self.cooldown {
                return false;
            }
        }

        self.logged += 1;
        self.last_logged = Some(now);
        true
    }

    /// Failures logged so far
    pub fn logged(&self) -> u32 {
        self.logged
    }

    /// Failures seen so far, logged or not
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn reset(&mut self) {
        self.failures = 0;
        self.logged = 0;
        self.last_logged = None;
    }
}
