use async_trait::async_trait;
use std::time::Duration;

use crate::errors::ProgressError;
use crate::progress::{wait_for_outcome, Outcome, TransformOutput};
use crate::retry::RetryPolicy;

/// Uniform contract over asynchronous work started on a backend.
///
/// A handle starts Pending and moves exactly once to Resolved, Failed or
/// Cancelled. Once terminal, no method probes the backend again.
#[async_trait]
pub trait ProgressHandle: Send + Sync {
    /// Stable, non-empty description used in logs, errors and combined result keys.
    fn identifier(&self) -> &str;

    /// Retry applied to each backend probe issued while waiting in [`result`](Self::result).
    fn rpc_retry(&self) -> &RetryPolicy;

    /// The terminal state, if reached. Never probes the backend.
    fn outcome(&self) -> Option<Outcome>;

    /// Check for completion with at most one backend probe, retried under `retry`.
    ///
    /// The first call that observes a terminal condition records it.
    async fn is_done(&self, retry: &RetryPolicy) -> bool;

    /// Wait for the terminal state.
    ///
    /// Probes are spaced along the `polling` backoff curve. Waiting stops at
    /// `timeout` or at the polling deadline, whichever comes first, with
    /// [`ProgressError::DeadlineExceeded`].
    async fn result(
        &self,
        timeout: Option<Duration>,
        polling: &RetryPolicy,
    ) -> Result<TransformOutput, ProgressError> {
        let outcome = wait_for_outcome(self, timeout, polling).await?;
        Ok(outcome.into_result(self.identifier())?)
    }

    /// Best-effort cancellation. Returns `false` when already done or unsupported.
    async fn cancel(&self) -> bool;

    fn is_cancelled(&self) -> bool;
}
