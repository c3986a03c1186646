// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for call retries and write throttling.

use crate::errors::BackendError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A backend call failed with a retryable error and will be attempted again.
///
/// # Log Level
/// `warn!` - Degraded behavior that recovered or may recover
///
/// # Example
/// ```
/// use std::time::Duration;
/// use transform_progress::errors::{BackendError, ErrorClass};
/// use transform_progress::observability::messages::retry::RetryScheduled;
///
/// let error = BackendError::new(ErrorClass::Unavailable, "connection reset");
/// let msg = RetryScheduled {
///     call: "get_run",
///     policy: "rpc",
///     attempt: 1,
///     delay: Duration::from_millis(100),
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct RetryScheduled<'a> {
    pub call: &'a str,
    pub policy: &'a str,
    pub attempt: u32,
    pub delay: Duration,
    pub error: &'a BackendError,
}

impl Display for RetryScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call '{}' failed on attempt {} ({}), retrying in {:?} under '{}' policy",
            self.call, self.attempt, self.error, self.delay, self.policy
        )
    }
}

impl StructuredLog for RetryScheduled<'_> {
    fn log(&self) {
        tracing::warn!(
            call = self.call,
            policy = self.policy,
            attempt = self.attempt,
            delay_ms = self.delay.as_millis() as u64,
            error_class = %self.error.class(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "retry_scheduled",
            span_name = name,
            call = self.call,
            policy = self.policy,
            attempt = self.attempt,
        )
    }
}

/// A retryable error kept failing until the policy gave up.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use transform_progress::errors::{BackendError, ErrorClass};
/// use transform_progress::observability::messages::retry::RetriesExhausted;
///
/// let error = BackendError::new(ErrorClass::DeadlineExceeded, "write timed out");
/// let msg = RetriesExhausted {
///     call: "write_record",
///     policy: "write",
///     attempts: 5,
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct RetriesExhausted<'a> {
    pub call: &'a str,
    pub policy: &'a str,
    pub attempts: u32,
    pub error: &'a BackendError,
}

impl Display for RetriesExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call '{}' gave up after {} attempts under '{}' policy: {}",
            self.call, self.attempts, self.policy, self.error
        )
    }
}

impl StructuredLog for RetriesExhausted<'_> {
    fn log(&self) {
        tracing::error!(
            call = self.call,
            policy = self.policy,
            attempts = self.attempts,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "retries_exhausted",
            span_name = name,
            call = self.call,
            attempts = self.attempts,
        )
    }
}

/// A writer was held back because its call window is full.
///
/// # Log Level
/// `debug!` - Expected throttling during bulk writes
///
/// # Example
/// ```
/// use std::time::Duration;
/// use transform_progress::observability::messages::retry::RateLimitWait;
///
/// let msg = RateLimitWait {
///     owner: "annotate asset-42",
///     wait: Duration::from_millis(750),
///     max_calls: 100,
///     period: Duration::from_secs(60),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct RateLimitWait<'a> {
    pub owner: &'a str,
    pub wait: Duration,
    pub max_calls: u32,
    pub period: Duration,
}

impl Display for RateLimitWait<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' reached {} calls per {:?}, waiting {:?}",
            self.owner, self.max_calls, self.period, self.wait
        )
    }
}

impl StructuredLog for RateLimitWait<'_> {
    fn log(&self) {
        tracing::debug!(
            owner = self.owner,
            wait_ms = self.wait.as_millis() as u64,
            max_calls = self.max_calls,
            period_ms = self.period.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "rate_limit_wait",
            span_name = name,
            owner = self.owner,
            wait = ?self.wait,
        )
    }
}
