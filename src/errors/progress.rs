// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors surfaced to callers waiting on a progress handle.
//!
//! `result()` only ever returns one of the two [`ProgressError`] variants. Raw
//! backend errors are wrapped as the `source` of a [`TransformError`] and never
//! returned on their own.

use crate::errors::BackendError;
use std::time::Duration;
use thiserror::Error;

/// A tracked transformation reached a failed or cancelled terminal state.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("transform '{identifier}' failed: {message}")]
pub struct TransformError {
    pub identifier: String,
    pub message: String,
    #[source]
    pub source: Option<BackendError>,
}

impl TransformError {
    pub fn new(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a backend failure, keeping it reachable through `source()`.
    pub fn from_backend(identifier: impl Into<String>, error: BackendError) -> Self {
        Self {
            identifier: identifier.into(),
            message: error.to_string(),
            source: Some(error),
        }
    }

    pub fn cancelled(identifier: impl Into<String>) -> Self {
        Self::new(identifier, "cancelled before completion")
    }
}

/// Error returned by `ProgressHandle::result`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProgressError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The local wait gave up. The tracked work may still complete remotely.
    #[error("timed out after {waited:?} waiting for '{identifier}'")]
    DeadlineExceeded { identifier: String, waited: Duration },
}

impl ProgressError {
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, ProgressError::DeadlineExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorClass;
    use std::error::Error;

    #[test]
    fn backend_cause_is_kept_as_source() {
        let cause = BackendError::new(ErrorClass::PermissionDenied, "no access to corpus");
        let err = TransformError::from_backend("analyze asset-7", cause.clone());

        assert_eq!(err.identifier, "analyze asset-7");
        assert!(err.to_string().contains("analyze asset-7"));
        assert!(err.to_string().contains("no access to corpus"));
        assert_eq!(err.source, Some(cause));
        assert!(Error::source(&err).is_some());
    }

    #[test]
    fn deadline_exceeded_is_distinct_from_transform_failure() {
        let timeout = ProgressError::DeadlineExceeded {
            identifier: "index corpus-1".to_string(),
            waited: Duration::from_secs(1),
        };
        assert!(timeout.is_deadline_exceeded());

        let failed: ProgressError = TransformError::cancelled("index corpus-1").into();
        assert!(!failed.is_deadline_exceeded());
        assert_eq!(
            failed.to_string(),
            "transform 'index corpus-1' failed: cancelled before completion"
        );
    }
}
