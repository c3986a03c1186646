// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Backoff policies, the call retry loop and the bulk-write rate limiter.

mod call;
mod policy;
mod rate_limiter;

pub use call::retry_call;
pub use policy::{Backoff, Delays, RetryPolicy};
pub use rate_limiter::{RateLimit, RateLimiter};
