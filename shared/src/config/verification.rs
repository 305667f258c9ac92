//! Verification code lifecycle configuration

use serde::{Deserialize, Serialize};

use super::{parse_or, EnvSource};

/// Default validity window for issued codes (15 minutes)
pub const DEFAULT_CODE_TTL_MINUTES: i64 = 15;

/// Longest accepted validity window (24 hours)
pub const MAX_CODE_TTL_MINUTES: i64 = 24 * 60;

/// Longest accepted retention after expiry (7 days)
pub const MAX_GRACE_PERIOD_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Configuration for code issuance, expiry and eviction
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
    /// Minutes an issued code stays redeemable
    pub code_ttl_minutes: i64,

    /// Seconds an expired record is retained before eviction
    #[serde(default = "default_grace_period")]
    pub grace_period_seconds: i64,

    /// Seconds between expired-record sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Whether the periodic sweep runs at all
    #[serde(default = "default_sweep_enabled")]
    pub sweep_enabled: bool,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
            grace_period_seconds: default_grace_period(),
            sweep_interval_seconds: default_sweep_interval(),
            sweep_enabled: default_sweep_enabled(),
        }
    }
}

impl VerificationConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_source(&super::process_env)
    }

    /// Create from an arbitrary variable source
    pub fn from_source(source: &EnvSource<'_>) -> Self {
        let defaults = Self::default();
        Self {
            code_ttl_minutes: parse_or(
                source,
                "VERIFICATION_CODE_TTL_MINUTES",
                defaults.code_ttl_minutes,
            ),
            grace_period_seconds: parse_or(
                source,
                "VERIFICATION_GRACE_PERIOD_SECONDS",
                defaults.grace_period_seconds,
            ),
            sweep_interval_seconds: parse_or(
                source,
                "VERIFICATION_SWEEP_INTERVAL_SECONDS",
                defaults.sweep_interval_seconds,
            ),
            sweep_enabled: parse_or(source, "VERIFICATION_SWEEP_ENABLED", defaults.sweep_enabled),
        }
    }
}

fn default_grace_period() -> i64 {
    300 // 5 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_sweep_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VerificationConfig::default();
        assert_eq!(config.code_ttl_minutes, 15);
        assert_eq!(config.grace_period_seconds, 300);
        assert!(config.sweep_enabled);
    }

    #[test]
    fn test_from_source_ignores_garbage() {
        let source = |key: &str| match key {
            "VERIFICATION_CODE_TTL_MINUTES" => Some("30".to_string()),
            "VERIFICATION_SWEEP_INTERVAL_SECONDS" => Some("soon".to_string()),
            "VERIFICATION_SWEEP_ENABLED" => Some("false".to_string()),
            _ => None,
        };
        let config = VerificationConfig::from_source(&source);
        assert_eq!(config.code_ttl_minutes, 30);
        assert_eq!(config.sweep_interval_seconds, 60);
        assert!(!config.sweep_enabled);
    }
}
