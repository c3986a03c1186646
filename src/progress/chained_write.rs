// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Write-back of an upstream result as a batch of records.
//!
//! A [`ChainedWriteProgress`] owns a one-shot completion task spawned on the
//! tokio runtime when the handle is created:
//!
//! ```text
//! upstream ──wait──> mapper ──records──> [acquire limiter] -> write_record ──> Written(true)
//!     │                 │                      ▲     │
//!     │                 │                      └retry┘ (deadline / unavailable / exhausted)
//!     ▼                 ▼                            ▼
//!  Failed/Cancelled   Failed                  Failed, remaining records abandoned
//! ```
//!
//! Records already written are never rolled back.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::errors::{BackendError, TransformError};
use crate::observability::messages::progress::{
    CancellationRequested, ChainedWritesAbandoned, ChainedWritesCompleted,
    ChainedWritesStarted,
};
use crate::observability::messages::StructuredLog;
use crate::progress::state::Completion;
use crate::progress::{wait_for_outcome, Outcome, TransformOutput};
use crate::proto::progress_v1::WriteRecord;
use crate::retry::{retry_call, RateLimit, RateLimiter, RetryPolicy};
use crate::traits::{ProgressHandle, RecordWriter};

/// Turns the upstream's output into the records to write, in write order.
pub type RecordMapper =
    dyn Fn(&TransformOutput) -> anyhow::Result<Vec<WriteRecord>> + Send + Sync;

/// Policies applied by the completion task.
#[derive(Debug, Clone)]
pub struct ChainedWriteOptions {
    /// Retry for each record write.
    pub write_retry: Arc<RetryPolicy>,
    /// Schedule for waiting on the upstream handle.
    pub polling: Arc<RetryPolicy>,
    /// Probe retry reported through [`ProgressHandle::rpc_retry`].
    pub rpc_retry: Arc<RetryPolicy>,
    pub rate_limit: RateLimit,
}

impl Default for ChainedWriteOptions {
    fn default() -> Self {
        Self {
            write_retry: Arc::new(RetryPolicy::write()),
            polling: Arc::new(RetryPolicy::polling()),
            rpc_retry: Arc::new(RetryPolicy::rpc()),
            rate_limit: RateLimit::default(),
        }
    }
}

/// Progress of writing an upstream result back to a target resource.
///
/// `is_done` never touches the backend; it reports whether the completion
/// task has recorded a terminal state.
pub struct ChainedWriteProgress {
    identifier: String,
    target: String,
    rpc_retry: Arc<RetryPolicy>,
    completion: Arc<Completion>,
    cancellation: CancellationToken,
}

impl ChainedWriteProgress {
    /// Creates the handle and spawns its completion task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        upstream: Arc<dyn ProgressHandle>,
        target: impl Into<String>,
        mapper: Arc<RecordMapper>,
        writer: Arc<dyn RecordWriter>,
        options: ChainedWriteOptions,
    ) -> Self {
        let target = target.into();
        let identifier = format!("{} -> {}", upstream.identifier(), target);
        let completion = Arc::new(Completion::new());
        let cancellation = CancellationToken::new();
        let rpc_retry = options.rpc_retry.clone();

        let task = WriteTask {
            identifier: identifier.clone(),
            target: target.clone(),
            upstream,
            mapper,
            writer,
            options,
            cancellation: cancellation.clone(),
        };
        let task_completion = completion.clone();
        tokio::spawn(async move {
            let outcome = task.run().await;
            let section = task_completion.enter().await;
            task_completion.resolve(&section, &task.identifier, outcome);
        });

        Self {
            identifier,
            target,
            rpc_retry,
            completion,
            cancellation,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl ProgressHandle for ChainedWriteProgress {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn rpc_retry(&self) -> &RetryPolicy {
        &self.rpc_retry
    }

    fn outcome(&self) -> Option<Outcome> {
        self.completion.get().cloned()
    }

    async fn is_done(&self, _retry: &RetryPolicy) -> bool {
        self.completion.is_set()
    }

    /// Stops the completion task before its next write. A write already in
    /// flight is allowed to finish.
    async fn cancel(&self) -> bool {
        let accepted = !self.completion.is_set() && !self.cancellation.is_cancelled();
        if accepted {
            self.cancellation.cancel();
        }
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

struct WriteTask {
    identifier: String,
    target: String,
    upstream: Arc<dyn ProgressHandle>,
    mapper: Arc<RecordMapper>,
    writer: Arc<dyn RecordWriter>,
    options: ChainedWriteOptions,
    cancellation: CancellationToken,
}

impl WriteTask {
    async fn run(&self) -> Outcome {
        let upstream = tokio::select! {
            _ = self.cancellation.cancelled() => {
                if self.upstream.outcome().is_none() {
                    self.upstream.cancel().await;
                }
                return Outcome::Cancelled;
            }
            waited = wait_for_outcome(self.upstream.as_ref(), None, &self.options.polling) => waited,
        };

        let output = match upstream {
            Ok(Outcome::Resolved(output)) => output,
            Ok(Outcome::Failed(error)) => return Outcome::Failed(error),
            Ok(Outcome::Cancelled) => return Outcome::Cancelled,
            Err(error) => {
                return Outcome::Failed(TransformError::new(&self.identifier, error.to_string()))
            }
        };

        let records = match (self.mapper)(&output) {
            Ok(records) => records,
            Err(error) => {
                return Outcome::Failed(TransformError::new(
                    &self.identifier,
                    format!("mapping upstream result failed: {error:#}"),
                ))
            }
        };

        ChainedWritesStarted {
            identifier: &self.identifier,
            target: &self.target,
            record_count: records.len(),
        }
        .log();

        let limiter = Mutex::new(RateLimiter::new(&self.identifier, self.options.rate_limit));
        for (written, record) in records.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                return Outcome::Cancelled;
            }
            if let Err(error) = self.write_record(&limiter, record).await {
                ChainedWritesAbandoned {
                    identifier: &self.identifier,
                    target: &self.target,
                    written,
                    remaining: records.len() - written - 1,
                    error: &error,
                }
                .log();
                return Outcome::Failed(TransformError::from_backend(&self.identifier, error));
            }
        }

        ChainedWritesCompleted {
            identifier: &self.identifier,
            target: &self.target,
            record_count: records.len(),
        }
        .log();
        Outcome::Resolved(TransformOutput::Written(true))
    }

    /// One record write. Every attempt, retries included, is charged to the limiter.
    async fn write_record(
        &self,
        limiter: &Mutex<RateLimiter>,
        record: &WriteRecord,
    ) -> Result<(), BackendError> {
        let writer = &self.writer;
        let target = self.target.as_str();
        retry_call(&self.options.write_retry, "write_record", || async move {
            limiter.lock().await.acquire().await;
            writer.write_record(target, record).await
        })
        .await
    }
}
