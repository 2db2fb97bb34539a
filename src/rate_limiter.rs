//! Request pacing for the tracklist HTTP service.
//!
//! Keeps a minimum interval between calls and backs off when the service
//! starts failing.

use std::thread;
use std::time::{Duration, Instant};

/// A rate limiter that enforces a minimum interval between requests
/// with adaptive backoff on failures.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    last_request: Option<Instant>,
    current_interval: Duration,
    base_interval: Duration,
    max_interval: Duration,
    success_count: u32,
    successes_to_reduce: u32,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// * `name` - label for log messages
    /// * `base_interval` - minimum time between requests
    /// * `max_interval` - upper bound after repeated failures
    /// * `successes_to_reduce` - consecutive successes before the interval is
    ///   halved again (0 disables the reduction)
    pub fn new(name: &str, base_interval: Duration, max_interval: Duration, successes_to_reduce: u32) -> Self {
        RateLimiter {
            name: name.to_string(),
            last_request: None,
            current_interval: base_interval,
            base_interval,
            max_interval,
            success_count: 0,
            successes_to_reduce,
        }
    }

    /// Base interval in milliseconds, max interval 16x base, reduce after
    /// 10 successes.
    pub fn from_millis(name: &str, millis: u64) -> Self {
        let base = Duration::from_millis(millis);
        Self::new(name, base, base * 16, 10)
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Sleep if not enough time has elapsed since the last request.
    /// Must be called *before* making a request.
    pub fn wait_if_needed(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.current_interval {
                let wait_time = self.current_interval - elapsed;
                tracing::debug!(limiter = %self.name, wait_secs = wait_time.as_secs_f64(), "rate limiting");
                thread::sleep(wait_time);
            }
        }
        self.last_request = Some(Instant::now());
    }

    /// Report a successful request.  After enough consecutive successes
    /// the interval is halved (down to the base).
    pub fn report_success(&mut self) {
        if self.successes_to_reduce == 0 {
            return;
        }

        self.success_count += 1;

        if self.success_count >= self.successes_to_reduce && self.current_interval > self.base_interval {
            self.current_interval = (self.current_interval / 2).max(self.base_interval);
            tracing::debug!(
                limiter = %self.name,
                interval_secs = self.current_interval.as_secs_f64(),
                successes = self.success_count,
                "rate limit reduced"
            );
            self.success_count = 0;
        }
    }

    /// Report a failed request.  Doubles the interval (up to max).
    pub fn report_failure(&mut self) {
        self.current_interval = (self.current_interval * 2).min(self.max_interval);
        tracing::warn!(
            limiter = %self.name,
            interval_secs = self.current_interval.as_secs_f64(),
            "rate limit increased after error"
        );
        self.success_count = 0;
    }
}
