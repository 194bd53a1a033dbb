//! Sync tuning knobs loaded from environment variables.
//!
//! Every knob has a default, so an empty environment yields a working
//! configuration. Unparseable values fall back to the default.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

const DEFAULT_CURSOR_THROTTLE_MS: u64 = 100;
const DEFAULT_TEXT_SAVE_DEBOUNCE_MS: u64 = 500;
const DEFAULT_FEED_RECONNECT_ATTEMPTS: u32 = 3;
const DEFAULT_FEED_RECONNECT_BASE_MS: u64 = 200;
const DEFAULT_FEED_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Minimum interval between outbound presence writes.
    pub cursor_throttle: Duration,
    /// Delay before a non-boundary text edit is committed.
    pub text_save_debounce: Duration,
    /// Resubscribe attempts after the change feed closes.
    pub feed_reconnect_attempts: u32,
    /// Base delay for exponential resubscribe back-off.
    pub feed_reconnect_base: Duration,
    /// Bounded change-feed buffer per subscriber.
    pub feed_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cursor_throttle: Duration::from_millis(DEFAULT_CURSOR_THROTTLE_MS),
            text_save_debounce: Duration::from_millis(DEFAULT_TEXT_SAVE_DEBOUNCE_MS),
            feed_reconnect_attempts: DEFAULT_FEED_RECONNECT_ATTEMPTS,
            feed_reconnect_base: Duration::from_millis(DEFAULT_FEED_RECONNECT_BASE_MS),
            feed_channel_capacity: DEFAULT_FEED_CHANNEL_CAPACITY,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            cursor_throttle: Duration::from_millis(env_parse("CURSOR_THROTTLE_MS", DEFAULT_CURSOR_THROTTLE_MS)),
            text_save_debounce: Duration::from_millis(env_parse(
                "TEXT_SAVE_DEBOUNCE_MS",
                DEFAULT_TEXT_SAVE_DEBOUNCE_MS,
            )),
            feed_reconnect_attempts: env_parse("FEED_RECONNECT_ATTEMPTS", DEFAULT_FEED_RECONNECT_ATTEMPTS),
            feed_reconnect_base: Duration::from_millis(env_parse(
                "FEED_RECONNECT_BASE_MS",
                DEFAULT_FEED_RECONNECT_BASE_MS,
            )),
            feed_channel_capacity: env_parse("FEED_CHANNEL_CAPACITY", DEFAULT_FEED_CHANNEL_CAPACITY).max(1),
        }
    }

    /// Back-off before resubscribe attempt `attempt` (zero-based), without jitter.
    #[must_use]
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        self.feed_reconnect_base.saturating_mul(1_u32 << attempt.min(16))
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    raw.trim().parse::<T>().unwrap_or(default)
}
