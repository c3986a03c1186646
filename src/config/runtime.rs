// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProgressConfig;
use crate::progress::ChainedWriteOptions;
use crate::retry::{RateLimit, RetryPolicy};

/// Shared, immutable policies built once from configuration.
///
/// Handles hold `Arc` clones, so one bundle can serve any number of them.
///
/// # Examples
///
/// ```
/// use transform_progress::config::ProgressConfig;
///
/// let cfg: ProgressConfig = toml::from_str("[write_retry]\nmax_attempts = 3\n").unwrap();
/// let policies = cfg.policies();
///
/// assert_eq!(policies.write.max_attempts(), Some(3));
/// assert_eq!(policies.rpc.name(), "rpc");
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicies {
    pub rpc: Arc<RetryPolicy>,
    pub polling: Arc<RetryPolicy>,
    pub write: Arc<RetryPolicy>,
    pub rate_limit: RateLimit,
}

impl RetryPolicies {
    pub fn from_config(cfg: &ProgressConfig) -> Self {
        Self {
            rpc: Arc::new(cfg.rpc_retry.to_policy(&RetryPolicy::rpc())),
            polling: Arc::new(cfg.polling_retry.to_policy(&RetryPolicy::polling())),
            write: Arc::new(cfg.write_retry.to_policy(&RetryPolicy::write())),
            rate_limit: RateLimit::new(
                cfg.rate_limit.get_max_calls(),
                Duration::from_secs(cfg.rate_limit.get_period_seconds()),
            ),
        }
    }

    pub fn chained_write_options(&self) -> ChainedWriteOptions {
        ChainedWriteOptions {
            write_retry: self.write.clone(),
            polling: self.polling.clone(),
            rpc_retry: self.rpc.clone(),
            rate_limit: self.rate_limit,
        }
    }
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self::from_config(&ProgressConfig::default())
    }
}

impl ProgressConfig {
    pub fn policies(&self) -> RetryPolicies {
        RetryPolicies::from_config(self)
    }
}
