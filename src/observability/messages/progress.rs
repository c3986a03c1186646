// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for progress handle lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Terminal transitions (resolved, failed, cancelled)
//! * Local wait timeouts
//! * Cancellation requests
//! * Chained write batches
//! * Fan-in aggregation

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A handle resolved successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use transform_progress::observability::messages::progress::ProgressResolved;
///
/// let msg = ProgressResolved {
///     identifier: "analyze asset-42",
///     output_kind: "response",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProgressResolved<'a> {
    pub identifier: &'a str,
    pub output_kind: &'a str,
}

impl Display for ProgressResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' resolved with {} output",
            self.identifier, self.output_kind
        )
    }
}

impl StructuredLog for ProgressResolved<'_> {
    fn log(&self) {
        tracing::info!(
            identifier = self.identifier,
            output_kind = self.output_kind,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "progress_resolved",
            span_name = name,
            identifier = self.identifier,
            output_kind = self.output_kind,
        )
    }
}

/// A handle reached the failed state.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use transform_progress::errors::TransformError;
/// use transform_progress::observability::messages::progress::ProgressFailed;
///
/// let error = TransformError::new("index corpus-1", "run failed: out of quota");
/// let msg = ProgressFailed {
///     identifier: "index corpus-1",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ProgressFailed<'a> {
    pub identifier: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ProgressFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "'{}' failed: {}", self.identifier, self.error)
    }
}

impl StructuredLog for ProgressFailed<'_> {
    fn log(&self) {
        tracing::error!(
            identifier = self.identifier,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "progress_failed",
            span_name = name,
            identifier = self.identifier,
            error = %self.error,
        )
    }
}

/// A handle reached the cancelled state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProgressCancelled<'a> {
    pub identifier: &'a str,
}

impl Display for ProgressCancelled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "'{}' was cancelled", self.identifier)
    }
}

impl StructuredLog for ProgressCancelled<'_> {
    fn log(&self) {
        tracing::info!(identifier = self.identifier, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "progress_cancelled",
            span_name = name,
            identifier = self.identifier,
        )
    }
}

/// Cancellation was requested on a handle.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use transform_progress::observability::messages::progress::CancellationRequested;
///
/// let msg = CancellationRequested {
///     identifier: "index corpus-1",
///     accepted: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CancellationRequested<'a> {
    pub identifier: &'a str,
    pub accepted: bool,
}

impl Display for CancellationRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.accepted {
            write!(f, "Cancellation of '{}' requested", self.identifier)
        } else {
            write!(f, "Cancellation of '{}' not possible", self.identifier)
        }
    }
}

impl StructuredLog for CancellationRequested<'_> {
    fn log(&self) {
        tracing::info!(
            identifier = self.identifier,
            accepted = self.accepted,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "cancellation_requested",
            span_name = name,
            identifier = self.identifier,
            accepted = self.accepted,
        )
    }
}

/// A caller stopped waiting on a handle that had not finished.
///
/// # Log Level
/// `warn!` - The remote work may still be running
///
/// # Example
/// ```
/// use std::time::Duration;
/// use transform_progress::observability::messages::progress::WaitDeadlineExceeded;
///
/// let msg = WaitDeadlineExceeded {
///     identifier: "analyze asset-42",
///     waited: Duration::from_secs(30),
///     probes: 6,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct WaitDeadlineExceeded<'a> {
    pub identifier: &'a str,
    pub waited: Duration,
    pub probes: u32,
}

impl Display for WaitDeadlineExceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Gave up waiting for '{}' after {:?} and {} probes",
            self.identifier, self.waited, self.probes
        )
    }
}

impl StructuredLog for WaitDeadlineExceeded<'_> {
    fn log(&self) {
        tracing::warn!(
            identifier = self.identifier,
            waited_ms = self.waited.as_millis() as u64,
            probes = self.probes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "wait_deadline_exceeded",
            span_name = name,
            identifier = self.identifier,
            waited = ?self.waited,
        )
    }
}

/// The upstream finished and the chained writes are about to be issued.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use transform_progress::observability::messages::progress::ChainedWritesStarted;
///
/// let msg = ChainedWritesStarted {
///     identifier: "annotate asset-42",
///     target: "corpora/c1/assets/asset-42",
///     record_count: 12,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ChainedWritesStarted<'a> {
    pub identifier: &'a str,
    pub target: &'a str,
    pub record_count: usize,
}

impl Display for ChainedWritesStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' writing {} records to '{}'",
            self.identifier, self.record_count, self.target
        )
    }
}

impl StructuredLog for ChainedWritesStarted<'_> {
    fn log(&self) {
        tracing::info!(
            identifier = self.identifier,
            target = self.target,
            record_count = self.record_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "chained_writes",
            span_name = name,
            identifier = self.identifier,
            target = self.target,
            record_count = self.record_count,
        )
    }
}

/// Every record of a chained batch was written.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ChainedWritesCompleted<'a> {
    pub identifier: &'a str,
    pub target: &'a str,
    pub record_count: usize,
}

impl Display for ChainedWritesCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' wrote {} records to '{}'",
            self.identifier, self.record_count, self.target
        )
    }
}

impl StructuredLog for ChainedWritesCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            identifier = self.identifier,
            target = self.target,
            record_count = self.record_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "chained_writes_completed",
            span_name = name,
            identifier = self.identifier,
            target = self.target,
        )
    }
}

/// A record write failed for good; the rest of the batch is abandoned.
///
/// Records written before the failure stay written.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ChainedWritesAbandoned<'a> {
    pub identifier: &'a str,
    pub target: &'a str,
    pub written: usize,
    pub remaining: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for ChainedWritesAbandoned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' abandoned writes to '{}' after {} records ({} not written): {}",
            self.identifier, self.target, self.written, self.remaining, self.error
        )
    }
}

impl StructuredLog for ChainedWritesAbandoned<'_> {
    fn log(&self) {
        tracing::error!(
            identifier = self.identifier,
            target = self.target,
            written = self.written,
            remaining = self.remaining,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "chained_writes_abandoned",
            span_name = name,
            identifier = self.identifier,
            target = self.target,
        )
    }
}

/// Two children of a combined handle share an identifier; the later result wins.
///
/// # Log Level
/// `warn!` - Potential issue or degraded behavior
pub struct DuplicateChildIdentifier<'a> {
    pub combined: &'a str,
    pub identifier: &'a str,
}

impl Display for DuplicateChildIdentifier<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "'{}' has more than one child named '{}'; keeping the last result",
            self.combined, self.identifier
        )
    }
}

impl StructuredLog for DuplicateChildIdentifier<'_> {
    fn log(&self) {
        tracing::warn!(
            combined = self.combined,
            identifier = self.identifier,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "duplicate_child_identifier",
            span_name = name,
            combined = self.combined,
            identifier = self.identifier,
        )
    }
}
