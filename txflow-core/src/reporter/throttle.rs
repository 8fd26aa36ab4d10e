//! Submission throttle - token bucket
//!
//! Keeps a burst of completed trades from flooding the price engine.
//!
//! ```text
//! Capacity: 200 tokens, refill 200/s
//!
//! t=0ms    [██████████] 200 → burst of 200 reports goes out
//! t=0ms    [░░░░░░░░░░]   0 → further reports throttled (counted, not sent)
//! t=100ms  [█░░░░░░░░░]  20 → 20 more reports allowed
//! ```
//!
//! Tokens are stored fixed-point (×1000) in an atomic so the check on the
//! hot path is a CAS loop; only the refill takes the mutex.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, warn};

const SCALE: u64 = 1_000;

/// Throttle configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleConfig {
    /// Sustained submissions per second
    pub max_per_second: u64,
    /// Tokens in a full bucket
    pub burst_capacity: u64,
}

impl ThrottleConfig {
    /// Sustained rate with a one-second burst
    pub fn per_second(max_per_second: u64) -> Self {
        Self {
            max_per_second,
            burst_capacity: max_per_second,
        }
    }
}

/// Token bucket shared by every in-flight report task
pub struct SubmissionThrottle {
    config: ThrottleConfig,
    /// Available tokens (fixed-point: tokens * 1000)
    tokens: AtomicU64,
    last_refill: Mutex<Instant>,
    allowed: AtomicU64,
    rejected: AtomicU64,
}

impl SubmissionThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            tokens: AtomicU64::new(config.burst_capacity * SCALE),
            last_refill: Mutex::new(Instant::now()),
            allowed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Throttle at `max_per_second`, or `None` when 0 (throttling off)
    pub fn from_rate(max_per_second: u64) -> Option<Self> {
        (max_per_second > 0).then(|| Self::new(ThrottleConfig::per_second(max_per_second)))
    }

    /// Consume one token if available
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Consume one token if available, refilling as of `now`
    pub fn allow_at(&self, now: Instant) -> bool {
        self.refill(now);

        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            if current < SCALE {
                let rejected = self.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                if rejected % 1_000 == 1 {
                    warn!(
                        allowed = self.allowed.load(Ordering::Relaxed),
                        rejected, "trade submissions throttled"
                    );
                }
                return false;
            }

            match self.tokens.compare_exchange_weak(
                current,
                current - SCALE,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    self.allowed.fetch_add(1, Ordering::Relaxed);
                    return true;
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn refill(&self, now: Instant) {
        let mut last_refill = self.last_refill.lock();
        let elapsed = now.saturating_duration_since(*last_refill);

        let to_add =
            (self.config.max_per_second as f64 * elapsed.as_secs_f64() * SCALE as f64) as u64;
        if to_add == 0 {
            return;
        }

        let max_tokens = self.config.burst_capacity * SCALE;
        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            let refilled = (current + to_add).min(max_tokens);
            match self.tokens.compare_exchange_weak(
                current,
                refilled,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        *last_refill = now;

        debug!(added = to_add / SCALE, "submission throttle refilled");
    }

    /// Whole tokens currently available
    pub fn available(&self) -> u64 {
        self.tokens.load(Ordering::Acquire) / SCALE
    }

    pub fn allowed(&self) -> u64 {
        self.allowed.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> ThrottleConfig {
        self.config
    }
}
