//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `cache` - Code store backend and Redis configuration
//! - `environment` - Environment detection and logging configuration
//! - `notification` - Email notifier and dispatch retry policy
//! - `verification` - Code lifetime and eviction

pub mod cache;
pub mod environment;
pub mod notification;
pub mod verification;

use serde::{Deserialize, Serialize};

pub use cache::{CacheConfig, StoreBackend};
pub use environment::{Environment, LogFormat, LoggingConfig};
pub use notification::NotificationConfig;
pub use verification::{
    VerificationConfig, DEFAULT_CODE_TTL_MINUTES, MAX_CODE_TTL_MINUTES, MAX_GRACE_PERIOD_SECONDS,
};

/// Lookup function for configuration variables
pub type EnvSource<'a> = dyn Fn(&str) -> Option<String> + 'a;

pub(crate) fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a variable, falling back to `default` when missing or malformed
pub(crate) fn parse_or<T: std::str::FromStr>(source: &EnvSource<'_>, key: &str, default: T) -> T {
    source(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppConfig {
    /// Environment configuration
    pub environment: Environment,

    /// Code lifecycle configuration
    pub verification: VerificationConfig,

    /// Notification configuration
    pub notification: NotificationConfig,

    /// Code store configuration
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the process environment
    ///
    /// Reads the environment-specific file (e.g. `.env.production`) and then
    /// `.env`; variables already set are never overridden.
    pub fn from_env() -> Self {
        dotenvy::from_filename(Environment::from_env().env_file()).ok();
        dotenvy::dotenv().ok();
        Self::from_source(&process_env)
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_source(source: &EnvSource<'_>) -> Self {
        let environment = Environment::from_source(source);
        Self {
            environment,
            verification: VerificationConfig::from_source(source),
            notification: NotificationConfig::from_source(source),
            cache: CacheConfig::from_source(source),
            logging: LoggingConfig::from_source(environment, source),
        }
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> Result<(), String> {
        let ttl = self.verification.code_ttl_minutes;
        if !(1..=MAX_CODE_TTL_MINUTES).contains(&ttl) {
            return Err(format!(
                "VERIFICATION_CODE_TTL_MINUTES must be between 1 and {}",
                MAX_CODE_TTL_MINUTES
            ));
        }
        let grace = self.verification.grace_period_seconds;
        if !(0..=MAX_GRACE_PERIOD_SECONDS).contains(&grace) {
            return Err(format!(
                "VERIFICATION_GRACE_PERIOD_SECONDS must be between 0 and {}",
                MAX_GRACE_PERIOD_SECONDS
            ));
        }
        if self.notification.max_attempts == 0 {
            return Err("NOTIFIER_MAX_ATTEMPTS must be at least 1".to_string());
        }
        if self.notification.queue_capacity == 0 {
            return Err("NOTIFIER_QUEUE_CAPACITY must be at least 1".to_string());
        }
        Ok(())
    }
}
