// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Declarative backoff configuration shared by every progress handle.
//!
//! A [`RetryPolicy`] is an immutable value. It drives two different loops:
//!
//! * **Call retries** ([`RetryPolicy::backoff`]): a failed backend call is
//!   retried while its [`ErrorClass`] is listed in the policy, the attempt
//!   ceiling has not been reached and the next sleep still fits the deadline.
//! * **Polling waits** ([`RetryPolicy::delays`]): the sleep between two
//!   unsuccessful `is_done` probes follows the same exponential curve, capped
//!   at the maximum delay. The retryable classes play no part there.
//!
//! Delays carry no jitter so that polling schedules stay predictable.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use transform_progress::errors::ErrorClass;
//! use transform_progress::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::new("lookup", Duration::from_millis(100), Duration::from_secs(1), 2.0)
//!     .with_max_attempts(4)
//!     .retry_on([ErrorClass::Unavailable]);
//!
//! let delays: Vec<Duration> = policy.delays().take(5).collect();
//! assert_eq!(delays[0], Duration::from_millis(100));
//! assert_eq!(delays[4], Duration::from_secs(1)); // capped
//! ```

use crate::config::consts::*;
use crate::errors::{BackendError, ErrorClass};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    name: String,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    deadline: Option<Duration>,
    max_attempts: Option<u32>,
    retry_on: Vec<ErrorClass>,
}

impl RetryPolicy {
    /// Creates a policy retrying every transient class, with no deadline and
    /// no attempt ceiling.
    pub fn new(
        name: impl Into<String>,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        Self {
            name: name.into(),
            initial_delay,
            max_delay: max_delay.max(initial_delay),
            multiplier: multiplier.max(1.0),
            deadline: None,
            max_attempts: None,
            retry_on: ErrorClass::TRANSIENT.to_vec(),
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    /// Replaces the set of retryable classes.
    pub fn retry_on(mut self, classes: impl IntoIterator<Item = ErrorClass>) -> Self {
        self.retry_on = classes.into_iter().collect();
        self
    }

    /// Short retry applied to individual RPCs such as status probes.
    pub fn rpc() -> Self {
        Self::new(
            "rpc",
            Duration::from_millis(DEFAULT_RPC_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_RPC_MAX_DELAY_MS),
            DEFAULT_RPC_MULTIPLIER,
        )
        .with_deadline(Duration::from_secs(DEFAULT_RPC_DEADLINE_SECONDS))
    }

    /// Long-horizon schedule used between `is_done` probes while waiting.
    pub fn polling() -> Self {
        Self::new(
            "polling",
            Duration::from_millis(DEFAULT_POLLING_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_POLLING_MAX_DELAY_MS),
            DEFAULT_POLLING_MULTIPLIER,
        )
        .with_deadline(Duration::from_secs(DEFAULT_POLLING_DEADLINE_SECONDS))
    }

    /// Retry for chained record writes. Only deadline, unavailable and
    /// exhausted-quota failures are retried.
    pub fn write() -> Self {
        Self::new(
            "write",
            Duration::from_millis(DEFAULT_WRITE_INITIAL_DELAY_MS),
            Duration::from_millis(DEFAULT_WRITE_MAX_DELAY_MS),
            DEFAULT_WRITE_MULTIPLIER,
        )
        .with_deadline(Duration::from_secs(DEFAULT_WRITE_DEADLINE_SECONDS))
        .with_max_attempts(DEFAULT_WRITE_MAX_ATTEMPTS)
        .retry_on([
            ErrorClass::DeadlineExceeded,
            ErrorClass::Unavailable,
            ErrorClass::ResourceExhausted,
        ])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn retryable_classes(&self) -> &[ErrorClass] {
        &self.retry_on
    }

    /// Permanent errors are never retried, even if their class is listed.
    pub fn is_retryable(&self, error: &BackendError) -> bool {
        error.is_transient() && self.retry_on.contains(&error.class())
    }

    /// Endless sequence of sleeps following the capped exponential curve.
    pub fn delays(&self) -> Delays {
        Delays {
            next: self.initial_delay,
            max: self.max_delay,
            multiplier: self.multiplier,
        }
    }

    /// Starts tracking one retried call. The deadline is measured from here.
    pub fn backoff(&self) -> Backoff<'_> {
        Backoff {
            policy: self,
            started: Instant::now(),
            attempts: 0,
            delays: self.delays(),
        }
    }
}

/// Iterator over the backoff curve of a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct Delays {
    next: Duration,
    max: Duration,
    multiplier: f64,
}

impl Iterator for Delays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next.min(self.max);
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max)
            .min(self.max);
        Some(current)
    }
}

/// Per-call retry bookkeeping.
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    started: Instant,
    attempts: u32,
    delays: Delays,
}

impl Backoff<'_> {
    /// Records a failed attempt and returns how long to sleep before the next
    /// one, or `None` when the error must be surfaced.
    pub fn on_error(&mut self, error: &BackendError) -> Option<Duration> {
        self.attempts += 1;

        if !self.policy.is_retryable(error) {
            return None;
        }
        if let Some(max_attempts) = self.policy.max_attempts {
            if self.attempts >= max_attempts {
                return None;
            }
        }

        let delay = self.delays.next()?;
        if let Some(deadline) = self.policy.deadline {
            if self.started.elapsed() + delay > deadline {
                return None;
            }
        }
        Some(delay)
    }

    /// Number of failed attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
