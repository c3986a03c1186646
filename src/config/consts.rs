/// Short RPC retry: first backoff delay (100 milliseconds)
pub const DEFAULT_RPC_INITIAL_DELAY_MS: u64 = 100;
/// Short RPC retry: delay cap (10 seconds)
pub const DEFAULT_RPC_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_RPC_MULTIPLIER: f64 = 1.3;
/// Short RPC retry: give up on a single call after one minute
pub const DEFAULT_RPC_DEADLINE_SECONDS: u64 = 60;

/// Long-horizon polling: first wait between probes (1 second)
pub const DEFAULT_POLLING_INITIAL_DELAY_MS: u64 = 1_000;
/// Long-horizon polling: wait cap between probes (60 seconds)
pub const DEFAULT_POLLING_MAX_DELAY_MS: u64 = 60_000;
pub const DEFAULT_POLLING_MULTIPLIER: f64 = 1.5;
/// Long-horizon polling: stop waiting after 12 hours
pub const DEFAULT_POLLING_DEADLINE_SECONDS: u64 = 12 * 60 * 60;

/// Chained write retry: first backoff delay (500 milliseconds)
pub const DEFAULT_WRITE_INITIAL_DELAY_MS: u64 = 500;
/// Chained write retry: delay cap (30 seconds)
pub const DEFAULT_WRITE_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_WRITE_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_WRITE_DEADLINE_SECONDS: u64 = 120;
/// Chained write retry: attempts per record, including the first call
pub const DEFAULT_WRITE_MAX_ATTEMPTS: u32 = 5;

/// Bulk write ceiling: calls allowed per period
pub const DEFAULT_RATE_LIMIT_MAX_CALLS: u32 = 100;
/// Bulk write ceiling: period length (60 seconds)
pub const DEFAULT_RATE_LIMIT_PERIOD_SECONDS: u64 = 60;
