// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating a loaded progress configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A backoff multiplier below 1.0 would shrink delays on every attempt
    MultiplierTooSmall {
        /// The policy section the value came from
        policy: String,
        multiplier: f64,
    },
    /// The first delay is already longer than the configured cap
    InitialDelayExceedsMaximum {
        policy: String,
        initial_delay_ms: u64,
        max_delay_ms: u64,
    },
    /// An attempt ceiling of zero would never issue the call
    ZeroMaxAttempts {
        policy: String,
    },
    /// The write retry must retry on at least one error class
    EmptyRetryClasses {
        policy: String,
    },
    /// The rate limiter needs a positive call budget and period
    InvalidRateLimit {
        max_calls: u32,
        period_seconds: u64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MultiplierTooSmall { policy, multiplier } => {
                write!(
                    f,
                    "Policy '{}' has multiplier {} which must be at least 1.0",
                    policy, multiplier
                )
            }
            ValidationError::InitialDelayExceedsMaximum {
                policy,
                initial_delay_ms,
                max_delay_ms,
            } => {
                write!(
                    f,
                    "Policy '{}' has initial_delay_ms {} greater than max_delay_ms {}",
                    policy, initial_delay_ms, max_delay_ms
                )
            }
            ValidationError::ZeroMaxAttempts { policy } => {
                write!(f, "Policy '{}' has max_attempts of 0", policy)
            }
            ValidationError::EmptyRetryClasses { policy } => {
                write!(f, "Policy '{}' must list at least one retry_on class", policy)
            }
            ValidationError::InvalidRateLimit {
                max_calls,
                period_seconds,
            } => {
                write!(
                    f,
                    "Rate limit of {} calls per {}s is invalid: both values must be positive",
                    max_calls, period_seconds
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format {0:?}: expected .yaml, .yml or .toml")]
    UnsupportedFormat(PathBuf),

    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
