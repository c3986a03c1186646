// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // scripted test backends
pub mod config;     // retry + rate limit configuration
pub mod errors;     // error handling
pub mod observability;
pub mod progress;   // progress handle variants
pub mod proto;      // backend message types
pub mod retry;      // backoff policies, retry loop, rate limiter
pub mod traits;     // unified abstractions
