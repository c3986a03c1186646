// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Classification of failures reported by backend RPC clients.
//!
//! Backend clients surface either gRPC status codes or HTTP status codes. Both
//! are folded into a single [`ErrorClass`] so retry policies can decide what to
//! retry by matching on an enum rather than on concrete client error types.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Enumerated classification of a backend failure.
///
/// The first six classes are transient: retry policies may retry them. Every
/// other class is permanent and short-circuits to a failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    DeadlineExceeded,
    Unavailable,
    ResourceExhausted,
    TooManyRequests,
    Internal,
    BadGateway,
    Cancelled,
    NotFound,
    AlreadyExists,
    InvalidArgument,
    PermissionDenied,
    Unauthenticated,
    FailedPrecondition,
    Unimplemented,
    Unknown,
}

impl ErrorClass {
    /// Every class that is safe to retry.
    pub const TRANSIENT: [ErrorClass; 6] = [
        ErrorClass::DeadlineExceeded,
        ErrorClass::Unavailable,
        ErrorClass::ResourceExhausted,
        ErrorClass::TooManyRequests,
        ErrorClass::Internal,
        ErrorClass::BadGateway,
    ];

    pub fn is_transient(self) -> bool {
        Self::TRANSIENT.contains(&self)
    }

    /// Classify a gRPC status code.
    pub fn from_rpc_code(code: tonic::Code) -> Self {
        match code {
            tonic::Code::DeadlineExceeded => ErrorClass::DeadlineExceeded,
            tonic::Code::Unavailable => ErrorClass::Unavailable,
            tonic::Code::ResourceExhausted => ErrorClass::ResourceExhausted,
            tonic::Code::Internal => ErrorClass::Internal,
            tonic::Code::Cancelled => ErrorClass::Cancelled,
            tonic::Code::NotFound => ErrorClass::NotFound,
            tonic::Code::AlreadyExists => ErrorClass::AlreadyExists,
            tonic::Code::InvalidArgument | tonic::Code::OutOfRange => ErrorClass::InvalidArgument,
            tonic::Code::PermissionDenied => ErrorClass::PermissionDenied,
            tonic::Code::Unauthenticated => ErrorClass::Unauthenticated,
            tonic::Code::FailedPrecondition | tonic::Code::Aborted => {
                ErrorClass::FailedPrecondition
            }
            tonic::Code::Unimplemented => ErrorClass::Unimplemented,
            tonic::Code::Ok | tonic::Code::Unknown | tonic::Code::DataLoss => ErrorClass::Unknown,
        }
    }

    /// Classify an HTTP status code returned by a REST transport.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorClass::InvalidArgument,
            401 => ErrorClass::Unauthenticated,
            403 => ErrorClass::PermissionDenied,
            404 => ErrorClass::NotFound,
            409 => ErrorClass::AlreadyExists,
            412 => ErrorClass::FailedPrecondition,
            429 => ErrorClass::TooManyRequests,
            500 => ErrorClass::Internal,
            501 => ErrorClass::Unimplemented,
            502 => ErrorClass::BadGateway,
            503 => ErrorClass::Unavailable,
            504 => ErrorClass::DeadlineExceeded,
            _ => ErrorClass::Unknown,
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::DeadlineExceeded => "deadline_exceeded",
            ErrorClass::Unavailable => "unavailable",
            ErrorClass::ResourceExhausted => "resource_exhausted",
            ErrorClass::TooManyRequests => "too_many_requests",
            ErrorClass::Internal => "internal",
            ErrorClass::BadGateway => "bad_gateway",
            ErrorClass::Cancelled => "cancelled",
            ErrorClass::NotFound => "not_found",
            ErrorClass::AlreadyExists => "already_exists",
            ErrorClass::InvalidArgument => "invalid_argument",
            ErrorClass::PermissionDenied => "permission_denied",
            ErrorClass::Unauthenticated => "unauthenticated",
            ErrorClass::FailedPrecondition => "failed_precondition",
            ErrorClass::Unimplemented => "unimplemented",
            ErrorClass::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failure reported by a backend RPC client.
///
/// The variant is chosen from the [`ErrorClass`] at construction time, so
/// callers never have to re-derive whether an error is retryable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Deadline, unavailable, exhausted, throttled, internal or bad gateway.
    #[error("transient backend error ({class}): {message}")]
    Transient { class: ErrorClass, message: String },

    /// Any other backend failure. Never retried.
    #[error("permanent backend error ({class}): {message}")]
    Permanent { class: ErrorClass, message: String },
}

impl BackendError {
    pub fn new(class: ErrorClass, message: impl Into<String>) -> Self {
        let message = message.into();
        if class.is_transient() {
            BackendError::Transient { class, message }
        } else {
            BackendError::Permanent { class, message }
        }
    }

    pub fn from_http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::from_http_status(status), message)
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            BackendError::Transient { class, .. } | BackendError::Permanent { class, .. } => *class,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            BackendError::Transient { message, .. } | BackendError::Permanent { message, .. } => {
                message
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient { .. })
    }
}

impl From<tonic::Status> for BackendError {
    fn from(status: tonic::Status) -> Self {
        BackendError::new(ErrorClass::from_rpc_code(status.code()), status.message())
    }
}
