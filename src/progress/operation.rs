// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Progress over a backend-native long-running operation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::{BackendError, ErrorClass, TransformError};
use crate::observability::messages::progress::CancellationRequested;
use crate::observability::messages::StructuredLog;
use crate::progress::state::Completion;
use crate::progress::{Outcome, TransformOutput};
use crate::proto::progress_v1::operation::Result as OperationResult;
use crate::proto::progress_v1::Operation;
use crate::retry::{retry_call, RetryPolicy};
use crate::traits::{LongRunningOperation, ProgressHandle};

/// Adapts a [`LongRunningOperation`] to [`ProgressHandle`].
///
/// Each `is_done` issues one poll of the operation, retried under the supplied
/// policy. A finished operation without a response resolves with
/// [`TransformOutput::NoValue`]; a finished operation whose error code is
/// `CANCELLED` resolves as cancelled.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use transform_progress::backends::stub::ScriptedOperation;
/// use transform_progress::progress::OperationProgress;
/// use transform_progress::retry::RetryPolicy;
/// use transform_progress::traits::ProgressHandle;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let operation = Arc::new(ScriptedOperation::completing_after("operations/delete-7", 1, None));
/// let progress = OperationProgress::new(operation);
///
/// let output = progress.result(None, &RetryPolicy::rpc()).await?;
/// assert!(output.is_no_value());
/// # Ok(())
/// # }
/// ```
pub struct OperationProgress {
    identifier: String,
    operation: Arc<dyn LongRunningOperation>,
    rpc_retry: Arc<RetryPolicy>,
    completion: Completion,
}

impl OperationProgress {
    /// Track `operation` under its own name, probing with the default RPC retry.
    pub fn new(operation: Arc<dyn LongRunningOperation>) -> Self {
        let identifier = match operation.name() {
            "" => "unnamed operation".to_string(),
            name => name.to_string(),
        };
        Self {
            identifier,
            operation,
            rpc_retry: Arc::new(RetryPolicy::rpc()),
            completion: Completion::new(),
        }
    }

    /// Replace the identifier. Empty identifiers are ignored.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        if !identifier.is_empty() {
            self.identifier = identifier;
        }
        self
    }

    pub fn with_rpc_retry(mut self, rpc_retry: Arc<RetryPolicy>) -> Self {
        self.rpc_retry = rpc_retry;
        self
    }

    fn terminal_outcome(&self, snapshot: Operation) -> Outcome {
        match snapshot.result {
            Some(OperationResult::Response(payload)) => {
                Outcome::Resolved(TransformOutput::Response(payload))
            }
            None => Outcome::Resolved(TransformOutput::NoValue),
            Some(OperationResult::Error(status)) => {
                let class = ErrorClass::from_rpc_code(tonic::Code::from(status.code));
                if class == ErrorClass::Cancelled {
                    Outcome::Cancelled
                } else {
                    Outcome::Failed(TransformError::from_backend(
                        &self.identifier,
                        BackendError::new(class, status.message),
                    ))
                }
            }
        }
    }
}

#[async_trait]
impl ProgressHandle for OperationProgress {
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

        let outcome = match retry_call(retry, "poll_operation", || self.operation.poll()).await {
            Ok(snapshot) if !snapshot.done => return false,
            Ok(snapshot) => self.terminal_outcome(snapshot),
            Err(error) => Outcome::Failed(TransformError::from_backend(&self.identifier, error)),
        };
        self.completion.resolve(&section, &self.identifier, outcome);
        true
    }

    async fn cancel(&self) -> bool {
        if self.completion.is_set() {
            return false;
        }
        let accepted = retry_call(&self.rpc_retry, "cancel_operation", || {
            self.operation.cancel()
        })
        .await
        .is_ok();
        CancellationRequested {
            identifier: &self.identifier,
            accepted,
        }
        .log();
        accepted
    }

    fn is_cancelled(&self) -> bool {
        self.completion.get().is_some_and(Outcome::is_cancelled)
    }
}
