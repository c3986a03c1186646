// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::*;
use crate::errors::{ConfigError, ErrorClass};
use crate::retry::RetryPolicy;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Retry and rate limit settings for progress handles.
///
/// Every section and field is optional; missing values fall back to the
/// built-in defaults in [`consts`](crate::config::consts).
///
/// ```yaml
/// rpc_retry:
///   initial_delay_ms: 100
///   max_delay_ms: 10000
///   multiplier: 1.3
///   deadline_seconds: 60
/// polling_retry:
///   max_delay_ms: 30000
/// write_retry:
///   max_attempts: 5
///   retry_on: [deadline_exceeded, unavailable, resource_exhausted]
/// rate_limit:
///   max_calls: 100
///   period_seconds: 60
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct ProgressConfig {
    #[serde(default)]
    pub rpc_retry: RetryPolicyConfig,
    #[serde(default)]
    pub polling_retry: RetryPolicyConfig,
    #[serde(default)]
    pub write_retry: RetryPolicyConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RetryPolicyConfig {
    pub initial_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
    pub deadline_seconds: Option<u64>,
    pub max_attempts: Option<u32>,
    pub retry_on: Option<Vec<ErrorClass>>,
}

impl RetryPolicyConfig {
    pub fn get_initial_delay_ms(&self, defaults: &RetryPolicy) -> u64 {
        self.initial_delay_ms
            .unwrap_or(defaults.initial_delay().as_millis() as u64)
    }

    pub fn get_max_delay_ms(&self, defaults: &RetryPolicy) -> u64 {
        self.max_delay_ms
            .unwrap_or(defaults.max_delay().as_millis() as u64)
    }

    pub fn get_multiplier(&self, defaults: &RetryPolicy) -> f64 {
        self.multiplier.unwrap_or(defaults.multiplier())
    }

    pub fn get_retry_on(&self, defaults: &RetryPolicy) -> Vec<ErrorClass> {
        self.retry_on
            .clone()
            .unwrap_or_else(|| defaults.retryable_classes().to_vec())
    }

    /// Overlays the configured fields onto `defaults`, keeping its name.
    pub fn to_policy(&self, defaults: &RetryPolicy) -> RetryPolicy {
        let mut policy = RetryPolicy::new(
            defaults.name(),
            Duration::from_millis(self.get_initial_delay_ms(defaults)),
            Duration::from_millis(self.get_max_delay_ms(defaults)),
            self.get_multiplier(defaults),
        )
        .retry_on(self.get_retry_on(defaults));

        let deadline = self
            .deadline_seconds
            .map(Duration::from_secs)
            .or(defaults.deadline());
        if let Some(deadline) = deadline {
            policy = policy.with_deadline(deadline);
        }
        if let Some(max_attempts) = self.max_attempts.or(defaults.max_attempts()) {
            policy = policy.with_max_attempts(max_attempts);
        }
        policy
    }
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RateLimitConfig {
    pub max_calls: Option<u32>,
    pub period_seconds: Option<u64>,
}

impl RateLimitConfig {
    pub fn get_max_calls(&self) -> u32 {
        self.max_calls.unwrap_or(DEFAULT_RATE_LIMIT_MAX_CALLS)
    }

    pub fn get_period_seconds(&self) -> u64 {
        self.period_seconds
            .unwrap_or(DEFAULT_RATE_LIMIT_PERIOD_SECONDS)
    }
}

/// Reads a YAML (`.yaml`, `.yml`) or TOML (`.toml`) configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProgressConfig, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    let is_toml = match extension.as_deref() {
        Some("yaml") | Some("yml") => false,
        Some("toml") => true,
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg = if is_toml {
        toml::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(cfg)
}

pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<ProgressConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_partial_yaml_config() {
        let yaml = r#"
polling_retry:
  initial_delay_ms: 250
  deadline_seconds: 600
write_retry:
  retry_on: [unavailable]
"#;

        let cfg: ProgressConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.polling_retry.initial_delay_ms, Some(250));
        assert_eq!(cfg.polling_retry.deadline_seconds, Some(600));
        assert_eq!(cfg.write_retry.retry_on, Some(vec![ErrorClass::Unavailable]));
        assert_eq!(cfg.rpc_retry, RetryPolicyConfig::default());
        assert_eq!(cfg.rate_limit.get_max_calls(), DEFAULT_RATE_LIMIT_MAX_CALLS);
    }

    #[test]
    fn overlay_keeps_unset_fields_from_defaults() {
        let overrides = RetryPolicyConfig {
            max_delay_ms: Some(2_000),
            max_attempts: Some(3),
            ..Default::default()
        };

        let policy = overrides.to_policy(&RetryPolicy::write());

        assert_eq!(policy.name(), "write");
        assert_eq!(
            policy.initial_delay(),
            Duration::from_millis(DEFAULT_WRITE_INITIAL_DELAY_MS)
        );
        assert_eq!(policy.max_delay(), Duration::from_secs(2));
        assert_eq!(policy.max_attempts(), Some(3));
        assert_eq!(
            policy.retryable_classes(),
            RetryPolicy::write().retryable_classes()
        );
        assert_eq!(
            policy.deadline(),
            Some(Duration::from_secs(DEFAULT_WRITE_DEADLINE_SECONDS))
        );
    }

    #[test]
    fn load_yaml_and_toml_files() {
        let yaml = write_config(".yaml", "rate_limit:\n  max_calls: 10\n  period_seconds: 1\n");
        let toml = write_config(".toml", "[rate_limit]\nmax_calls = 10\nperiod_seconds = 1\n");

        let from_yaml = load_and_validate_config(yaml.path()).unwrap();
        let from_toml = load_and_validate_config(toml.path()).unwrap();

        assert_eq!(from_yaml, from_toml);
        assert_eq!(from_yaml.rate_limit.get_max_calls(), 10);
        assert_eq!(from_toml.rate_limit.get_period_seconds(), 1);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = write_config(".json", "{}");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");

        match load_config(&path) {
            Err(ConfigError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_config(".yml", "rpc_retry: [not, a, map]\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn unknown_error_class_is_a_parse_error() {
        let file = write_config(".toml", "[write_retry]\nretry_on = [\"sometimes\"]\n");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let yaml = r#"
rpc_retry:
  multiplier: 0.5
polling_retry:
  initial_delay_ms: 5000
  max_delay_ms: 1000
rate_limit:
  max_calls: 0
"#;
        let file = write_config(".yaml", yaml);

        match load_and_validate_config(file.path()) {
            Err(ConfigError::Invalid(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.contains(&ValidationError::MultiplierTooSmall {
                    policy: "rpc_retry".to_string(),
                    multiplier: 0.5,
                }));
                assert!(errors.contains(&ValidationError::InvalidRateLimit {
                    max_calls: 0,
                    period_seconds: DEFAULT_RATE_LIMIT_PERIOD_SECONDS,
                }));
            }
            other => panic!("expected validation errors, got {other:?}"),
        }
    }
}
