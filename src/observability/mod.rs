// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Diagnostic output goes through message structs in [`messages`] rather than
//! ad hoc format strings. Each message implements `Display` and
//! [`messages::StructuredLog`], so the same event can be logged with
//! structured fields or turned into a span.
//!
//! # Usage
//!
//! ```rust
//! use transform_progress::observability::messages::progress::ProgressFailed;
//! use transform_progress::errors::TransformError;
//!
//! let error = TransformError::new("analyze asset-42", "backend rejected request");
//! let msg = ProgressFailed {
//!     identifier: "analyze asset-42",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// `default_directive` (for example `"transform_progress=info"`) applies when
/// `RUST_LOG` is unset or unparsable. Returns an error if a global subscriber
/// is already installed, which callers in tests can ignore.
pub fn init_tracing(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
}
