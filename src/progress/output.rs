// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::errors::TransformError;
use crate::proto::progress_v1::{AnyPayload, ProcessRun};

/// Value a progress handle resolves with.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    /// The work succeeded without producing a response, e.g. a deletion.
    NoValue,
    /// Response payload of a long-running operation.
    Response(AnyPayload),
    /// Resource fetched when its run state reached completion.
    Resource(ProcessRun),
    /// Outcome of a chained write batch.
    Written(bool),
    /// Child identifier to child result, from a combined handle.
    Combined(HashMap<String, TransformOutput>),
}

impl TransformOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            TransformOutput::NoValue => "no_value",
            TransformOutput::Response(_) => "response",
            TransformOutput::Resource(_) => "resource",
            TransformOutput::Written(_) => "written",
            TransformOutput::Combined(_) => "combined",
        }
    }

    pub fn is_no_value(&self) -> bool {
        matches!(self, TransformOutput::NoValue)
    }

    pub fn as_response(&self) -> Option<&AnyPayload> {
        match self {
            TransformOutput::Response(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ProcessRun> {
        match self {
            TransformOutput::Resource(run) => Some(run),
            _ => None,
        }
    }

    pub fn as_combined(&self) -> Option<&HashMap<String, TransformOutput>> {
        match self {
            TransformOutput::Combined(results) => Some(results),
            _ => None,
        }
    }
}

/// Terminal state of a progress handle.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Resolved(TransformOutput),
    Failed(TransformError),
    Cancelled,
}

impl Outcome {
    /// Cancellation is reported to callers as a transform failure.
    pub fn into_result(self, identifier: &str) -> Result<TransformOutput, TransformError> {
        match self {
            Outcome::Resolved(output) => Ok(output),
            Outcome::Failed(error) => Err(error),
            Outcome::Cancelled => Err(TransformError::cancelled(identifier)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}
