// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Progress inferred from a resource's run state.
//!
//! Some backends start work without returning an operation handle. The only
//! signal is the run state of the resource itself, so completion is detected
//! by fetching the resource and checking for one of the two terminal states:
//!
//! ```text
//! UNSPECIFIED / PENDING / RUNNING / <unknown>  -> keep polling
//! COMPLETED                                    -> resolved with the fetched resource
//! FAILED                                       -> failed with the resource's failure reason
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::TransformError;
use crate::observability::messages::progress::CancellationRequested;
use crate::observability::messages::StructuredLog;
use crate::progress::state::Completion;
use crate::progress::{Outcome, TransformOutput};
use crate::proto::progress_v1::RunState;
use crate::retry::{retry_call, RetryPolicy};
use crate::traits::{ProgressHandle, ResourceStateClient};

/// Tracks a resource whose execution is owned by the remote system.
///
/// Cancellation is not supported: [`ProgressHandle::cancel`] always returns `false`.
pub struct ResourceStateProgress {
    identifier: String,
    resource_name: String,
    client: Arc<dyn ResourceStateClient>,
    rpc_retry: Arc<RetryPolicy>,
    completion: Completion,
}

impl ResourceStateProgress {
    pub fn new(resource_name: impl Into<String>, client: Arc<dyn ResourceStateClient>) -> Self {
        let resource_name = resource_name.into();
        let identifier = if resource_name.is_empty() {
            "unnamed resource".to_string()
        } else {
            resource_name.clone()
        };
        Self {
            identifier,
            resource_name,
            client,
            rpc_retry: Arc::new(RetryPolicy::rpc()),
            completion: Completion::new(),
        }
    }

    pub fn with_rpc_retry(mut self, rpc_retry: Arc<RetryPolicy>) -> Self {
        self.rpc_retry = rpc_retry;
        self
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }
}

#[async_trait]
impl ProgressHandle for ResourceStateProgress {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn rpc_retry(&self) -> &RetryPolicy {
        &self.rpc_retry
    }

    fn outcome(&self) -> Option<Outcome> {
        self.completion.get().cloned()
    }

    async fn is_done(&self, retry: &RetryPolicy) -> bool {
        if self.completion.is_set() {
            return true;
        }
        let section = self.completion.enter().await;
        if self.completion.is_set() {
            return true;
        }

        let run = match retry_call(retry, "get_run", || self.client.get_run(&self.resource_name))
            .await
        {
            Ok(run) => run,
            Err(error) => {
                let failed = TransformError::from_backend(&self.identifier, error);
                self.completion
                    .resolve(&section, &self.identifier, Outcome::Failed(failed));
                return true;
            }
        };

        let state = RunState::try_from(run.state).unwrap_or(RunState::Unspecified);
        let outcome = match state {
            RunState::Completed => Outcome::Resolved(TransformOutput::Resource(run)),
            RunState::Failed => {
                let reason = if run.failure_reason.is_empty() {
                    "run failed without a reported reason".to_string()
                } else {
                    run.failure_reason
                };
                Outcome::Failed(TransformError::new(&self.identifier, reason))
            }
            RunState::Unspecified | RunState::Pending | RunState::Running => return false,
        };
        self.completion.resolve(&section, &self.identifier, outcome);
        true
    }

    async fn cancel(&self) -> bool {
        CancellationRequested {
            identifier: &self.identifier,
            accepted: false,
        }
        .log();
        false
    }

    fn is_cancelled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::ScriptedRunClient;
    use crate::errors::{BackendError, ErrorClass, ProgressError};
    use crate::proto::progress_v1::ProcessRun;
    use std::time::Duration;

    const RUN: &str = "projects/p/runs/r1";

    fn run(state: RunState) -> ProcessRun {
        ProcessRun {
            name: RUN.to_string(),
            state: state as i32,
            ..Default::default()
        }
    }

    fn fast_polling() -> RetryPolicy {
        RetryPolicy::new("poll", Duration::from_millis(10), Duration::from_millis(20), 2.0)
    }

    #[tokio::test(start_paused = true)]
    async fn running_running_completed_sequence() {
        let mut completed = run(RunState::Completed);
        completed.output = Some(crate::proto::progress_v1::AnyPayload {
            type_url: "type.example.com/IndexStats".to_string(),
            value: b"42".to_vec(),
        });
        let client = Arc::new(ScriptedRunClient::new(vec![
            Ok(run(RunState::Running)),
            Ok(run(RunState::Running)),
            Ok(completed.clone()),
        ]));
        let progress = ResourceStateProgress::new(RUN, client.clone());
        let retry = RetryPolicy::rpc();

        assert!(!progress.is_done(&retry).await);
        assert!(!progress.is_done(&retry).await);
        assert!(progress.is_done(&retry).await);

        let output = progress.result(None, &fast_polling()).await.unwrap();
        assert_eq!(output, TransformOutput::Resource(completed));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unspecified_state_is_not_terminal() {
        let client = Arc::new(ScriptedRunClient::new(vec![
            Ok(run(RunState::Unspecified)),
            Ok(run(RunState::Pending)),
        ]));
        let progress = ResourceStateProgress::new(RUN, client);

        assert!(!progress.is_done(&RetryPolicy::rpc()).await);
        assert!(!progress.is_done(&RetryPolicy::rpc()).await);
        assert_eq!(progress.outcome(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_state_uses_the_failure_reason() {
        let mut failed = run(RunState::Failed);
        failed.failure_reason = "model artifact missing".to_string();
        let client = Arc::new(ScriptedRunClient::new(vec![Ok(failed)]));
        let progress = ResourceStateProgress::new(RUN, client);

        match progress.result(None, &fast_polling()).await {
            Err(ProgressError::Transform(error)) => {
                assert_eq!(error.identifier, RUN);
                assert_eq!(error.message, "model artifact missing");
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_lookup_failure_fails_the_handle() {
        let client = Arc::new(ScriptedRunClient::new(vec![Err(BackendError::new(
            ErrorClass::NotFound,
            "run deleted",
        ))]));
        let progress = ResourceStateProgress::new(RUN, client.clone());

        assert!(progress.is_done(&RetryPolicy::rpc()).await);
        assert!(matches!(progress.outcome(), Some(Outcome::Failed(_))));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_is_unsupported() {
        let client = Arc::new(ScriptedRunClient::new(vec![Ok(run(RunState::Running))]));
        let progress = ResourceStateProgress::new(RUN, client.clone());

        assert!(!progress.cancel().await);
        assert!(!progress.is_cancelled());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_probes_resolve_once() {
        let client = Arc::new(ScriptedRunClient::new(vec![
            Ok(run(RunState::Completed)),
            Ok(run(RunState::Failed)),
        ]));
        let progress = Arc::new(ResourceStateProgress::new(RUN, client.clone()));

        let probes: Vec<_> = (0..8)
            .map(|_| {
                let progress = progress.clone();
                tokio::spawn(async move { progress.is_done(&RetryPolicy::rpc()).await })
            })
            .collect();
        for probe in probes {
            assert!(probe.await.unwrap());
        }

        assert_eq!(client.call_count(), 1);
        assert!(matches!(
            progress.outcome(),
            Some(Outcome::Resolved(TransformOutput::Resource(_)))
        ));
    }
}
