//! # Infrastructure Layer
//!
//! Concrete implementations behind the verification core:
//! - **Cache**: Redis client and the Redis-backed code store
//! - **Email**: notifier implementations
//! - **Telemetry**: tracing subscriber setup
//! - **Bootstrap**: wiring the service from configuration

// Re-export core types for convenience
pub use pv_core::errors::*;

/// Cache module - Redis client and code store
pub mod cache;

/// Email module - notifier implementations
pub mod email;

/// Tracing subscriber initialisation
pub mod telemetry;

/// Service wiring from `AppConfig`
pub mod bootstrap;

pub use bootstrap::{build_verification_service, VerificationRuntime};

/// Configuration module for infrastructure services
pub mod config {
    //! Shared configuration used by infrastructure services
    pub use pv_shared::config::{
        AppConfig, CacheConfig, LoggingConfig, NotificationConfig, StoreBackend,
    };
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Stored value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Email notifier error
    #[error("Notification error: {0}")]
    Notification(String),
}

impl From<InfrastructureError> for DomainError {
    fn from(error: InfrastructureError) -> Self {
        DomainError::storage(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_error_maps_to_storage() {
        let error: DomainError = InfrastructureError::Config("bad url".to_string()).into();
        assert!(matches!(error, DomainError::Storage { .. }));
        assert!(error.is_retryable());
    }
}
