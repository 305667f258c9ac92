//! Notification dispatch configuration

use serde::{Deserialize, Serialize};

use super::{parse_or, EnvSource};

/// Email notification provider and dispatch policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Notifier provider ("log")
    pub provider: String,

    /// Sender address shown in outgoing mail
    pub from_address: String,

    /// Send attempts per message before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the second attempt, doubled afterwards
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound for the backoff delay
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Timeout for a single send attempt
    #[serde(default = "default_send_timeout")]
    pub send_timeout_seconds: u64,

    /// Pending messages buffered before new ones are rejected
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            provider: String::from("log"),
            from_address: String::from("no-reply@pollualert.local"),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            send_timeout_seconds: default_send_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl NotificationConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_source(&super::process_env)
    }

    /// Create from an arbitrary variable source
    pub fn from_source(source: &EnvSource<'_>) -> Self {
        let defaults = Self::default();
        Self {
            provider: source("NOTIFIER_PROVIDER").unwrap_or(defaults.provider),
            from_address: source("NOTIFIER_FROM_ADDRESS").unwrap_or(defaults.from_address),
            max_attempts: parse_or(source, "NOTIFIER_MAX_ATTEMPTS", defaults.max_attempts),
            base_backoff_ms: parse_or(source, "NOTIFIER_BASE_BACKOFF_MS", defaults.base_backoff_ms),
            max_backoff_ms: parse_or(source, "NOTIFIER_MAX_BACKOFF_MS", defaults.max_backoff_ms),
            send_timeout_seconds: parse_or(
                source,
                "NOTIFIER_SEND_TIMEOUT_SECONDS",
                defaults.send_timeout_seconds,
            ),
            queue_capacity: parse_or(source, "NOTIFIER_QUEUE_CAPACITY", defaults.queue_capacity),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    5000
}

fn default_send_timeout() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    1024
}
