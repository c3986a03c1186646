// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sliding-window call limiter for bulk writes.
//!
//! The limiter keeps the timestamps of the most recent calls. A caller that
//! would push the window above `max_calls` sleeps until the oldest call ages
//! out of the window; calls are delayed, never dropped.
//!
//! A limiter is owned by exactly one write loop, which is why [`RateLimiter::acquire`]
//! takes `&mut self` instead of locking.

use crate::config::consts::{DEFAULT_RATE_LIMIT_MAX_CALLS, DEFAULT_RATE_LIMIT_PERIOD_SECONDS};
use crate::observability::messages::retry::RateLimitWait;
use crate::observability::messages::StructuredLog;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Calls-per-period ceiling. At least one call is always admitted per period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    max_calls: u32,
    period: Duration,
}

impl RateLimit {
    pub fn new(max_calls: u32, period: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            period,
        }
    }

    pub fn max_calls(&self) -> u32 {
        self.max_calls
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        Self::new(
            DEFAULT_RATE_LIMIT_MAX_CALLS,
            Duration::from_secs(DEFAULT_RATE_LIMIT_PERIOD_SECONDS),
        )
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    owner: String,
    limit: RateLimit,
    calls: VecDeque<Instant>,
}

impl RateLimiter {
    /// `owner` names the write loop in log output.
    pub fn new(owner: impl Into<String>, limit: RateLimit) -> Self {
        Self {
            owner: owner.into(),
            limit,
            calls: VecDeque::with_capacity(limit.max_calls as usize),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Waits until one more call fits in the window, records it, and returns
    /// how long the caller was held back.
    pub async fn acquire(&mut self) -> Duration {
        let mut waited = Duration::ZERO;
        loop {
            let now = Instant::now();
            while let Some(&oldest) = self.calls.front() {
                if now.duration_since(oldest) >= self.limit.period {
                    self.calls.pop_front();
                } else {
                    break;
                }
            }

            if self.calls.len() < self.limit.max_calls as usize {
                self.calls.push_back(now);
                return waited;
            }

            // Window is full: the front entry is the oldest call still inside it
            let Some(&oldest) = self.calls.front() else {
                self.calls.push_back(now);
                return waited;
            };
            let until = oldest + self.limit.period;
            let wait = until.saturating_duration_since(now);
            RateLimitWait {
                owner: &self.owner,
                wait,
                max_calls: self.limit.max_calls,
                period: self.limit.period,
            }
            .log();
            tokio::time::sleep_until(until).await;
            waited += wait;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn calls_under_the_ceiling_are_not_delayed() {
        let mut limiter = RateLimiter::new("test", RateLimit::new(3, Duration::from_secs(1)));
        for _ in 0..3 {
            assert_eq!(limiter.acquire().await, Duration::ZERO);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn writes_spread_across_periods_without_exceeding_the_window() {
        let max_calls = 3usize;
        let period = Duration::from_secs(1);
        let total = 10usize;
        let mut limiter = RateLimiter::new("test", RateLimit::new(max_calls as u32, period));

        let start = Instant::now();
        let mut issued = Vec::with_capacity(total);
        for _ in 0..total {
            limiter.acquire().await;
            issued.push(Instant::now());
        }

        // ceil(10 / 3) = 4 periods: the last call cannot start before 3 full periods elapsed
        let periods = (total + max_calls - 1) / max_calls;
        let span = issued[total - 1].duration_since(start);
        assert!(span >= period * (periods as u32 - 1), "span was {:?}", span);

        // Any max_calls + 1 consecutive calls must stretch over at least one period
        for window in issued.windows(max_calls + 1) {
            assert!(window[max_calls].duration_since(window[0]) >= period);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn blocked_caller_reports_wait_time() {
        let mut limiter = RateLimiter::new("test", RateLimit::new(1, Duration::from_millis(500)));
        limiter.acquire().await;
        let waited = limiter.acquire().await;
        assert_eq!(waited, Duration::from_millis(500));
    }

    #[test]
    fn zero_calls_is_clamped_to_one() {
        let limit = RateLimit::new(0, Duration::from_secs(1));
        assert_eq!(limit.max_calls(), 1);
        assert_eq!(limit.period(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_call_limit_still_admits_one_call_per_period() {
        let mut limiter = RateLimiter::new("test", RateLimit::new(0, Duration::from_secs(1)));

        let first = tokio::time::timeout(Duration::from_millis(200), limiter.acquire()).await;
        assert_eq!(first, Ok(Duration::ZERO));

        let second = tokio::time::timeout(Duration::from_secs(2), limiter.acquire()).await;
        assert_eq!(second, Ok(Duration::from_secs(1)));
    }
}
