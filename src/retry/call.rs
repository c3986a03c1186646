// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::BackendError;
use crate::observability::messages::retry::{RetriesExhausted, RetryScheduled};
use crate::observability::messages::StructuredLog;
use crate::retry::RetryPolicy;
use std::future::Future;

/// Runs `call` until it succeeds or `policy` refuses another attempt.
///
/// Between attempts the task sleeps for the delay prescribed by the policy's
/// backoff curve. The last error is returned unchanged once retries stop, so
/// callers can still tell transient exhaustion from a permanent failure.
pub async fn retry_call<T, F, Fut>(
    policy: &RetryPolicy,
    call_name: &str,
    mut call: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut backoff = policy.backoff();
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) => match backoff.on_error(&error) {
                Some(delay) => {
                    RetryScheduled {
                        call: call_name,
                        policy: policy.name(),
                        attempt: backoff.attempts(),
                        delay,
                        error: &error,
                    }
                    .log();
                    tokio::time::sleep(delay).await;
                }
                None => {
                    if policy.is_retryable(&error) {
                        RetriesExhausted {
                            call: call_name,
                            policy: policy.name(),
                            attempts: backoff.attempts(),
                            error: &error,
                        }
                        .log();
                    }
                    return Err(error);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorClass;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy::new("quick", Duration::from_millis(10), Duration::from_millis(40), 2.0)
            .with_max_attempts(4)
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_call(&quick_policy(), "get_run", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(BackendError::new(ErrorClass::Unavailable, "warming up"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_returns_after_one_call() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_call(&quick_policy(), "get_run", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::new(ErrorClass::InvalidArgument, "bad name"))
        })
        .await;

        assert_eq!(result.unwrap_err().class(), ErrorClass::InvalidArgument);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_return_the_last_transient_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_call(&quick_policy(), "write_record", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::new(ErrorClass::DeadlineExceeded, "slow"))
        })
        .await;

        let error = result.unwrap_err();
        assert!(error.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
