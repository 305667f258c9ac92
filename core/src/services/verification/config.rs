//! Configuration for the verification service, dispatcher and sweeper

use chrono::Duration;
use std::time::Duration as StdDuration;

use pv_shared::config::{
    NotificationConfig, VerificationConfig, DEFAULT_CODE_TTL_MINUTES, MAX_CODE_TTL_MINUTES,
    MAX_GRACE_PERIOD_SECONDS,
};

/// Configuration for the verification service
#[derive(Debug, Clone)]
pub struct VerificationServiceConfig {
    /// Number of minutes before a verification code expires
    pub code_ttl_minutes: i64,
}

impl Default for VerificationServiceConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
        }
    }
}

impl VerificationServiceConfig {
    /// Validity window, clamped to the accepted range
    pub fn code_ttl(&self) -> Duration {
        Duration::minutes(self.code_ttl_minutes.clamp(1, MAX_CODE_TTL_MINUTES))
    }
}

impl From<&VerificationConfig> for VerificationServiceConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            code_ttl_minutes: config.code_ttl_minutes,
        }
    }
}

/// Retry and queueing policy of the notification dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Send attempts per job, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each further attempt
    pub base_backoff: StdDuration,
    /// Cap on the delay between attempts
    pub max_backoff: StdDuration,
    /// Timeout applied to every individual send
    pub send_timeout: StdDuration,
    /// Jobs buffered before `enqueue` starts rejecting
    pub queue_capacity: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::from(&NotificationConfig::default())
    }
}

impl DispatcherConfig {
    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> StdDuration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

impl From<&NotificationConfig> for DispatcherConfig {
    fn from(config: &NotificationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_backoff: StdDuration::from_millis(config.base_backoff_ms),
            max_backoff: StdDuration::from_millis(config.max_backoff_ms),
            send_timeout: StdDuration::from_secs(config.send_timeout_seconds),
            queue_capacity: config.queue_capacity.max(1),
        }
    }
}

/// Configuration for the expired-record sweeper
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// How often to sweep
    pub interval: StdDuration,
    /// Retention after expiry before a record is evicted
    pub grace_period: Duration,
    /// Whether the background task runs
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self::from(&VerificationConfig::default())
    }
}

impl From<&VerificationConfig> for SweeperConfig {
    fn from(config: &VerificationConfig) -> Self {
        Self {
            interval: StdDuration::from_secs(config.sweep_interval_seconds.max(1)),
            grace_period: Duration::seconds(
                config.grace_period_seconds.clamp(0, MAX_GRACE_PERIOD_SECONDS),
            ),
            enabled: config.sweep_enabled,
        }
    }
}
