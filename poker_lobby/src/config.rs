//! Lobby configuration.
//!
//! Tunables for the wallet ledger, the join/leave sagas, table listing and the
//! room coordinator. Everything has a sensible default so the lobby can run
//! without any environment set.

use std::env;
use std::time::Duration;

/// Retry policy for compensating wallet credits (refunds and cash-outs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    ///
    /// Doubles per attempt, capped at `max_delay`, with up to 25% random
    /// jitter added so concurrent retries do not line up.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);

        let jitter_cap = (base.as_millis() as u64) / 4;
        let jitter = if jitter_cap == 0 {
            0
        } else {
            rand::random_range(0..=jitter_cap)
        };

        (base + Duration::from_millis(jitter)).min(self.max_delay)
    }

    /// Policy that retries immediately, for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(2000),
        }
    }
}

/// Lobby configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyConfig {
    /// Starting balance of a freshly opened wallet
    pub default_wallet_balance: i64,

    /// Retry policy for refunds and cash-outs
    pub compensation: RetryPolicy,

    /// Page size used when the caller does not ask for one
    pub list_default_limit: i64,

    /// Largest page size a caller may ask for
    pub list_max_limit: i64,

    /// Capacity of each connection's outbound event queue
    pub room_outbox_capacity: usize,

    /// Chat messages are truncated to this many characters
    pub chat_max_len: usize,
}

impl LobbyConfig {
    /// Create configuration from environment variables
    ///
    /// Recognized variables (all optional):
    /// - `DEFAULT_WALLET_BALANCE` (default: 1000)
    /// - `COMPENSATION_MAX_ATTEMPTS` (default: 5)
    /// - `COMPENSATION_BASE_DELAY_MS` (default: 50)
    /// - `COMPENSATION_MAX_DELAY_MS` (default: 2000)
    /// - `TABLE_LIST_DEFAULT_LIMIT` (default: 20)
    /// - `TABLE_LIST_MAX_LIMIT` (default: 100)
    /// - `ROOM_OUTBOX_CAPACITY` (default: 64)
    /// - `CHAT_MAX_LEN` (default: 500)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            default_wallet_balance: parse_env_or(
                "DEFAULT_WALLET_BALANCE",
                defaults.default_wallet_balance,
            ),
            compensation: RetryPolicy {
                max_attempts: parse_env_or(
                    "COMPENSATION_MAX_ATTEMPTS",
                    defaults.compensation.max_attempts,
                )
                .max(1),
                base_delay: Duration::from_millis(parse_env_or(
                    "COMPENSATION_BASE_DELAY_MS",
                    defaults.compensation.base_delay.as_millis() as u64,
                )),
                max_delay: Duration::from_millis(parse_env_or(
                    "COMPENSATION_MAX_DELAY_MS",
                    defaults.compensation.max_delay.as_millis() as u64,
                )),
            },
            list_default_limit: parse_env_or("TABLE_LIST_DEFAULT_LIMIT", defaults.list_default_limit),
            list_max_limit: parse_env_or("TABLE_LIST_MAX_LIMIT", defaults.list_max_limit),
            room_outbox_capacity: parse_env_or(
                "ROOM_OUTBOX_CAPACITY",
                defaults.room_outbox_capacity,
            )
            .max(1),
            chat_max_len: parse_env_or("CHAT_MAX_LEN", defaults.chat_max_len),
        }
    }
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            default_wallet_balance: 1000,
            compensation: RetryPolicy::default(),
            list_default_limit: 20,
            list_max_limit: 100,
            room_outbox_capacity: 64,
            chat_max_len: 500,
        }
    }
}

/// Parse an environment variable, falling back to `default` when it is unset
/// or does not parse.
pub fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
