// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Duration;
use tokio::time::Instant;

use crate::errors::ProgressError;
use crate::observability::messages::progress::WaitDeadlineExceeded;
use crate::observability::messages::StructuredLog;
use crate::progress::Outcome;
use crate::retry::RetryPolicy;
use crate::traits::ProgressHandle;

/// Probe `handle` until it reaches a terminal state or the wait limit passes.
///
/// The limit is the smaller of `timeout` and the polling deadline. A probe that
/// is still in flight when the limit passes is abandoned, so the overshoot is
/// bounded by the last (capped) polling sleep rather than by backend latency.
pub async fn wait_for_outcome<H>(
    handle: &H,
    timeout: Option<Duration>,
    polling: &RetryPolicy,
) -> Result<Outcome, ProgressError>
where
    H: ProgressHandle + ?Sized,
{
    let started = Instant::now();
    let limit = match (timeout, polling.deadline()) {
        (Some(timeout), Some(deadline)) => Some(timeout.min(deadline)),
        (timeout, deadline) => timeout.or(deadline),
    };
    let mut delays = polling.delays();
    let mut probes = 0u32;

    loop {
        probes += 1;
        let probe = handle.is_done(handle.rpc_retry());
        let done = match limit {
            Some(limit) => {
                let remaining = limit.saturating_sub(started.elapsed());
                tokio::time::timeout(remaining, probe).await.unwrap_or(false)
            }
            None => probe.await,
        };
        if done {
            if let Some(outcome) = handle.outcome() {
                return Ok(outcome);
            }
        }

        let elapsed = started.elapsed();
        let delay = delays.next().unwrap_or_else(|| polling.max_delay());
        match limit {
            Some(limit) if elapsed >= limit => {
                WaitDeadlineExceeded {
                    identifier: handle.identifier(),
                    waited: elapsed,
                    probes,
                }
                .log();
                return Err(ProgressError::DeadlineExceeded {
                    identifier: handle.identifier().to_string(),
                    waited: elapsed,
                });
            }
            Some(limit) => tokio::time::sleep(delay.min(limit - elapsed)).await,
            None => tokio::time::sleep(delay).await,
        }
    }
}
