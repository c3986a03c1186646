// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit the same event with structured fields.
//!
//! # Organization
//!
//! * `progress` - progress handle lifecycle, chained writes and fan-in events
//! * `retry` - call retries, retry exhaustion and rate limiter waits
//!
//! # Usage Pattern
//!
//! ```rust
//! use transform_progress::observability::messages::progress::ProgressResolved;
//! use transform_progress::observability::messages::StructuredLog;
//!
//! let msg = ProgressResolved {
//!     identifier: "analyze asset-42",
//!     output_kind: "response",
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod progress;
pub mod retry;

/// Emits a message as a structured `tracing` event at its documented level.
pub trait StructuredLog {
    /// Emit the event with structured fields.
    fn log(&self);

    /// Build a span carrying the same fields, for work scoped to this event.
    fn span(&self, name: &str) -> Span;
}
