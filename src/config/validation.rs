// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sanity checks for a loaded [`ProgressConfig`].
//!
//! Values are checked after defaults are applied, so a section that only
//! raises `initial_delay_ms` is still compared against the default cap.
//! Every problem is collected rather than stopping at the first one.
//!
//! ```rust
//! use transform_progress::config::{validate_config, ProgressConfig};
//!
//! let cfg: ProgressConfig = serde_yaml::from_str("rate_limit:\n  period_seconds: 0\n").unwrap();
//! let errors = validate_config(&cfg).unwrap_err();
//! assert_eq!(errors.len(), 1);
//! ```

use crate::config::{ProgressConfig, RetryPolicyConfig};
use crate::errors::ValidationError;
use crate::retry::RetryPolicy;

pub fn validate_config(cfg: &ProgressConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_policy("rpc_retry", &cfg.rpc_retry, &RetryPolicy::rpc(), &mut errors);
    validate_policy(
        "polling_retry",
        &cfg.polling_retry,
        &RetryPolicy::polling(),
        &mut errors,
    );
    validate_policy("write_retry", &cfg.write_retry, &RetryPolicy::write(), &mut errors);

    // An empty list elsewhere just disables call retries.
    if cfg.write_retry.get_retry_on(&RetryPolicy::write()).is_empty() {
        errors.push(ValidationError::EmptyRetryClasses {
            policy: "write_retry".to_string(),
        });
    }

    let max_calls = cfg.rate_limit.get_max_calls();
    let period_seconds = cfg.rate_limit.get_period_seconds();
    if max_calls == 0 || period_seconds == 0 {
        errors.push(ValidationError::InvalidRateLimit {
            max_calls,
            period_seconds,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_policy(
    section: &str,
    policy: &RetryPolicyConfig,
    defaults: &RetryPolicy,
    errors: &mut Vec<ValidationError>,
) {
    let multiplier = policy.get_multiplier(defaults);
    if multiplier.is_nan() || multiplier < 1.0 {
        errors.push(ValidationError::MultiplierTooSmall {
            policy: section.to_string(),
            multiplier,
        });
    }

    let initial_delay_ms = policy.get_initial_delay_ms(defaults);
    let max_delay_ms = policy.get_max_delay_ms(defaults);
    if initial_delay_ms > max_delay_ms {
        errors.push(ValidationError::InitialDelayExceedsMaximum {
            policy: section.to_string(),
            initial_delay_ms,
            max_delay_ms,
        });
    }

    if policy.max_attempts == Some(0) {
        errors.push(ValidationError::ZeroMaxAttempts {
            policy: section.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&ProgressConfig::default()).is_ok());
    }

    #[test]
    fn raised_initial_delay_is_checked_against_the_default_cap() {
        let cfg = ProgressConfig {
            rpc_retry: RetryPolicyConfig {
                initial_delay_ms: Some(20_000),
                ..Default::default()
            },
            ..Default::default()
        };

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InitialDelayExceedsMaximum {
                policy: "rpc_retry".to_string(),
                initial_delay_ms: 20_000,
                max_delay_ms: 10_000,
            }]
        );
    }

    #[test]
    fn write_retry_needs_a_retry_class() {
        let cfg = ProgressConfig {
            write_retry: RetryPolicyConfig {
                retry_on: Some(Vec::new()),
                ..Default::default()
            },
            rpc_retry: RetryPolicyConfig {
                retry_on: Some(Vec::new()),
                ..Default::default()
            },
            ..Default::default()
        };

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::EmptyRetryClasses {
                policy: "write_retry".to_string()
            }]
        );
    }

    #[test]
    fn all_problems_are_reported_together() {
        let cfg = ProgressConfig {
            polling_retry: RetryPolicyConfig {
                multiplier: Some(0.9),
                max_attempts: Some(0),
                ..Default::default()
            },
            rate_limit: RateLimitConfig {
                max_calls: Some(10),
                period_seconds: Some(0),
            },
            ..Default::default()
        };

        let errors = validate_config(&cfg).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("polling_retry") && e.to_string().contains("0.9")));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::ZeroMaxAttempts { .. })));
    }
}
