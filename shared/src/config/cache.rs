//! Code store configuration module

use serde::{Deserialize, Serialize};

use super::EnvSource;

/// Backend holding outstanding verification codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map, swept periodically
    #[default]
    Memory,
    /// Redis with native key expiry
    Redis,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(format!("Invalid code store backend: {}", s)),
        }
    }
}

/// Redis / code store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Which backend stores codes
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection URL
    pub url: String,

    /// Connection attempts before giving up
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,

    /// Base delay between connection attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Optional key prefix, e.g. "pollu"
    #[serde(default)]
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: String::from("redis://localhost:6379"),
            connect_retries: default_connect_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_source(&super::process_env)
    }

    /// Create from an arbitrary variable source
    pub fn from_source(source: &EnvSource<'_>) -> Self {
        let defaults = Self::default();
        Self {
            backend: source("CODE_STORE_BACKEND")
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.backend),
            url: source("REDIS_URL").unwrap_or(defaults.url),
            key_prefix: source("REDIS_KEY_PREFIX").filter(|p| !p.is_empty()),
            ..defaults
        }
    }

    /// Create a new cache configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix for all cache keys
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Generate a cache key with prefix
    pub fn make_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

fn default_connect_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_cache_config_with_prefix() {
        let config = CacheConfig::new("redis://cache:6379").with_prefix("pollu");
        assert_eq!(
            config.make_key("verification:reset_password:a@x.com"),
            "pollu:verification:reset_password:a@x.com"
        );
    }

    #[test]
    fn test_cache_key_without_prefix() {
        let config = CacheConfig::default();
        assert_eq!(config.make_key("verification:x"), "verification:x");
    }

    #[test]
    fn test_backend_from_source() {
        let source = |key: &str| match key {
            "CODE_STORE_BACKEND" => Some("Redis".to_string()),
            "REDIS_KEY_PREFIX" => Some(String::new()),
            _ => None,
        };
        let config = CacheConfig::from_source(&source);
        assert_eq!(config.backend, StoreBackend::Redis);
        assert!(config.key_prefix.is_none());
    }
}
