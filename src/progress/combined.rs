// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-in over a list of heterogeneous progress handles.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::observability::messages::progress::{CancellationRequested, DuplicateChildIdentifier};
use crate::observability::messages::StructuredLog;
use crate::progress::state::Completion;
use crate::progress::{Outcome, TransformOutput};
use crate::retry::RetryPolicy;
use crate::traits::ProgressHandle;

/// Resolves once every child has reached a terminal state.
///
/// The result maps each child identifier to its output. If any child failed
/// or was cancelled, the combined handle fails with the error of the first
/// such child in list order, regardless of which one finished first.
///
/// ```text
/// children:   [a: resolved] [b: failed(e1)] [c: failed(e2)]
/// combined:   failed(e1)
/// ```
pub struct CombinedProgress {
    identifier: String,
    children: Vec<Arc<dyn ProgressHandle>>,
    rpc_retry: Arc<RetryPolicy>,
    completion: Completion,
}

impl CombinedProgress {
    pub fn new(children: Vec<Arc<dyn ProgressHandle>>) -> Self {
        let names: Vec<&str> = children.iter().map(|child| child.identifier()).collect();
        let identifier = format!("combined[{}]", names.join(", "));
        Self {
            identifier,
            children,
            rpc_retry: Arc::new(RetryPolicy::rpc()),
            completion: Completion::new(),
        }
    }

    pub fn with_rpc_retry(mut self, rpc_retry: Arc<RetryPolicy>) -> Self {
        self.rpc_retry = rpc_retry;
        self
    }

    pub fn children(&self) -> &[Arc<dyn ProgressHandle>] {
        &self.children
    }

    /// Folds terminal child outcomes. `None` if a child has no outcome yet.
    fn aggregate(&self) -> Option<Outcome> {
        let mut results = HashMap::with_capacity(self.children.len());
        for child in &self.children {
            let output = match child.outcome()? {
                Outcome::Resolved(output) => output,
                failed => {
                    return failed
                        .into_result(child.identifier())
                        .err()
                        .map(Outcome::Failed)
                }
            };
            if results.insert(child.identifier().to_string(), output).is_some() {
                DuplicateChildIdentifier {
                    combined: &self.identifier,
                    identifier: child.identifier(),
                }
                .log();
            }
        }
        Some(Outcome::Resolved(TransformOutput::Combined(results)))
    }
}

#[async_trait]
impl ProgressHandle for CombinedProgress {
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
        for child in &self.children {
            if !child.is_done(retry).await {
                return false;
            }
        }

        let section = self.completion.enter().await;
        if self.completion.is_set() {
            return true;
        }
        match self.aggregate() {
            Some(outcome) => {
                self.completion.resolve(&section, &self.identifier, outcome);
                true
            }
            None => false,
        }
    }

    /// Requests cancellation of every child that has not finished.
    async fn cancel(&self) -> bool {
        if self.completion.is_set() {
            return false;
        }
        let mut accepted = false;
        for child in self.children.iter().filter(|child| child.outcome().is_none()) {
            accepted |= child.cancel().await;
        }
        CancellationRequested {
            identifier: &self.identifier,
            accepted,
        }
        .log();
        accepted
    }

    /// True once any child has been cancelled, whether or not this handle has
    /// finished. A cancelled child makes the combined result fail when it resolves.
    fn is_cancelled(&self) -> bool {
        self.children.iter().any(|child| child.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{ScriptedOperation, ScriptedRunClient};
    use crate::errors::ProgressError;
    use crate::progress::{OperationProgress, ResourceStateProgress};
    use crate::proto::progress_v1::{AnyPayload, ProcessRun, RunState, Status};
    use std::time::Duration;

    fn fast_polling() -> RetryPolicy {
        RetryPolicy::new("poll", Duration::from_millis(10), Duration::from_millis(50), 2.0)
    }

    fn response(tag: u8) -> Option<AnyPayload> {
        Some(AnyPayload {
            type_url: "type.example.com/Summary".to_string(),
            value: vec![tag],
        })
    }

    fn operation(name: &str, pending_polls: u32) -> Arc<dyn ProgressHandle> {
        Arc::new(OperationProgress::new(Arc::new(ScriptedOperation::completing_after(
            name,
            pending_polls,
            response(pending_polls as u8),
        ))))
    }

    fn failing(name: &str, pending_polls: u32, message: &str) -> Arc<dyn ProgressHandle> {
        Arc::new(OperationProgress::new(Arc::new(ScriptedOperation::failing_after(
            name,
            pending_polls,
            Status {
                code: tonic::Code::FailedPrecondition as i32,
                message: message.to_string(),
            },
        ))))
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_with_one_entry_per_child() {
        let run = ProcessRun {
            name: "runs/r1".to_string(),
            state: RunState::Completed as i32,
            ..Default::default()
        };
        let children = vec![
            operation("operations/a", 0),
            operation("operations/b", 3),
            Arc::new(ResourceStateProgress::new(
                "runs/r1",
                Arc::new(ScriptedRunClient::new(vec![Ok(run.clone())])),
            )) as Arc<dyn ProgressHandle>,
        ];
        let combined = CombinedProgress::new(children);
        assert_eq!(
            combined.identifier(),
            "combined[operations/a, operations/b, runs/r1]"
        );

        let output = combined.result(None, &fast_polling()).await.unwrap();
        let results = output.as_combined().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results["operations/b"],
            TransformOutput::Response(response(3).unwrap())
        );
        assert_eq!(results["runs/r1"], TransformOutput::Resource(run));
    }

    #[tokio::test(start_paused = true)]
    async fn not_done_until_every_child_is_done() {
        let slow = operation("operations/slow", 2);
        let combined = CombinedProgress::new(vec![operation("operations/fast", 0), slow.clone()]);
        let retry = RetryPolicy::rpc();

        assert!(!combined.is_done(&retry).await);
        assert!(!combined.is_done(&retry).await);
        assert_eq!(combined.outcome(), None);
        assert!(combined.is_done(&retry).await);
        assert!(slow.outcome().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn first_failure_in_list_order_wins() {
        // "late" fails after more polls but sits earlier in the list.
        let combined = CombinedProgress::new(vec![
            operation("operations/ok", 0),
            failing("operations/late", 4, "late failure"),
            failing("operations/early", 0, "early failure"),
        ]);

        match combined.result(None, &fast_polling()).await {
            Err(ProgressError::Transform(error)) => {
                assert_eq!(error.identifier, "operations/late");
                assert!(error.message.contains("late failure"));
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_targets_only_unfinished_children() {
        let finished_op = Arc::new(ScriptedOperation::completing_after("operations/done", 0, None));
        let pending_op = Arc::new(ScriptedOperation::pending("operations/pending"));
        let finished: Arc<dyn ProgressHandle> =
            Arc::new(OperationProgress::new(finished_op.clone()));
        let pending: Arc<dyn ProgressHandle> =
            Arc::new(OperationProgress::new(pending_op.clone()));
        assert!(finished.is_done(&RetryPolicy::rpc()).await);

        let combined = CombinedProgress::new(vec![finished, pending]);
        assert!(combined.cancel().await);
        assert_eq!(finished_op.cancel_count(), 0);
        assert_eq!(pending_op.cancel_count(), 1);

        assert!(combined.is_done(&RetryPolicy::rpc()).await);
        assert!(combined.is_cancelled());
        let error = combined.result(None, &fast_polling()).await.unwrap_err();
        assert!(error.to_string().contains("operations/pending"));
        assert!(!combined.cancel().await);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_identifiers_keep_the_last_result() {
        let combined = CombinedProgress::new(vec![
            operation("operations/same", 0),
            operation("operations/same", 1),
        ]);

        let output = combined.result(None, &fast_polling()).await.unwrap();
        let results = output.as_combined().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            results["operations/same"],
            TransformOutput::Response(response(1).unwrap())
        );
    }

    #[tokio::test]
    async fn empty_combination_resolves_immediately() {
        let combined = CombinedProgress::new(Vec::new());
        assert!(combined.is_done(&RetryPolicy::rpc()).await);
        assert_eq!(
            combined.outcome(),
            Some(Outcome::Resolved(TransformOutput::Combined(HashMap::new())))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_child_is_reported_before_the_combination_resolves() {
        let cancelled: Arc<dyn ProgressHandle> = Arc::new(OperationProgress::new(Arc::new(
            ScriptedOperation::pending("operations/stopped"),
        )));
        assert!(cancelled.cancel().await);
        assert!(cancelled.is_done(&RetryPolicy::rpc()).await);

        let combined = CombinedProgress::new(vec![cancelled, operation("operations/slow", 5)]);

        assert!(!combined.is_done(&RetryPolicy::rpc()).await);
        assert_eq!(combined.outcome(), None);
        assert!(combined.is_cancelled());
    }
}
