//! Cache and monitor configuration.
//!
//! Every knob has a production default; environment variables only override.
//! `from_vars` exists so tests can pass a map instead of mutating the
//! process environment.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Default maximum number of cached entries.
pub const DEFAULT_CAPACITY: usize = 16;

/// Default minimum wait between an unsubscribe and the next subscribe of the
/// same track, to avoid a transport-side session/encryption race.
pub const DEFAULT_RESUBSCRIBE_COOLDOWN_MS: u64 = 500;

/// Default wait inside a track reset between unsubscribe and re-enqueue.
pub const DEFAULT_RESET_DELAY_MS: u64 = 500;

/// Default cache mailbox buffer size.
pub const DEFAULT_MAILBOX_BUFFER: usize = 256;

/// Default stuck-stream check interval.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 3_000;

/// Default ceiling on automatic reset attempts per track.
pub const DEFAULT_MAX_RESET_ATTEMPTS: u32 = 3;

/// Default cap on the exponential reset backoff window.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Default upper bound of the random jitter before a reset attempt.
pub const DEFAULT_RESET_JITTER_MS: u64 = 100;

/// Configuration for a [`crate::cache::TrackCacheHandle`] instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries; unpinned entries beyond this are evicted.
    pub capacity: usize,
    /// Minimum wait between unsubscribe and the next subscribe of a track.
    pub resubscribe_cooldown: Duration,
    /// Wait between unsubscribe and re-enqueue during a track reset.
    pub reset_delay: Duration,
    /// Mailbox buffer size for the cache task.
    pub mailbox_buffer: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            resubscribe_cooldown: Duration::from_millis(DEFAULT_RESUBSCRIBE_COOLDOWN_MS),
            reset_delay: Duration::from_millis(DEFAULT_RESET_DELAY_MS),
            mailbox_buffer: DEFAULT_MAILBOX_BUFFER,
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let capacity = vars
            .get("TC_CACHE_CAPACITY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CAPACITY);

        let resubscribe_cooldown = vars
            .get("TC_RESUBSCRIBE_COOLDOWN_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_RESUBSCRIBE_COOLDOWN_MS));

        let reset_delay = vars
            .get("TC_RESET_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_RESET_DELAY_MS));

        let mailbox_buffer = vars
            .get("TC_MAILBOX_BUFFER")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAILBOX_BUFFER);

        Self {
            capacity,
            resubscribe_cooldown,
            reset_delay,
            mailbox_buffer,
        }
    }

    /// Same configuration with a different capacity.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

/// Configuration for a [`crate::monitor::StuckTrackMonitor`] instance.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between liveness checks.
    pub check_interval: Duration,
    /// Ceiling on automatic reset attempts per track.
    pub max_reset_attempts: u32,
    /// Cap on the exponential per-track backoff window.
    pub max_backoff: Duration,
    /// Upper bound of the random jitter before a reset attempt.
    pub reset_jitter: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_millis(DEFAULT_CHECK_INTERVAL_MS),
            max_reset_attempts: DEFAULT_MAX_RESET_ATTEMPTS,
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            reset_jitter: Duration::from_millis(DEFAULT_RESET_JITTER_MS),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    #[must_use]
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let check_interval = vars
            .get("TC_MONITOR_INTERVAL_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_CHECK_INTERVAL_MS));

        let max_reset_attempts = vars
            .get("TC_MONITOR_MAX_RESET_ATTEMPTS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_RESET_ATTEMPTS);

        let max_backoff = vars
            .get("TC_MONITOR_MAX_BACKOFF_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_MAX_BACKOFF_MS));

        let reset_jitter = vars
            .get("TC_MONITOR_RESET_JITTER_MS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_RESET_JITTER_MS));

        Self {
            check_interval,
            max_reset_attempts,
            max_backoff,
            reset_jitter,
        }
    }
}
