//! Builds the verification service from `AppConfig`

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use pv_core::repositories::{CodeStore, InMemoryCodeStore};
use pv_core::services::verification::{
    CodeSweeper, DispatchStats, DispatcherConfig, NotificationDispatcher, Notifier,
    SweeperConfig, VerificationService, VerificationServiceConfig,
};
use pv_shared::config::{AppConfig, StoreBackend};

use crate::cache::RedisCodeStore;
use crate::email::LogNotifier;
use crate::InfrastructureError;

/// Running verification service with its background tasks
pub struct VerificationRuntime {
    pub service: VerificationService<dyn CodeStore>,
    pub store: Arc<dyn CodeStore>,
    pub sweeper: Option<JoinHandle<()>>,
}

impl VerificationRuntime {
    /// Stop the sweeper and drain pending emails
    pub async fn shutdown(self) -> DispatchStats {
        if let Some(sweeper) = self.sweeper {
            sweeper.abort();
        }
        let stats = self.service.shutdown().await;
        info!(
            delivered = stats.delivered,
            failed = stats.failed,
            superseded = stats.superseded,
            "Verification runtime stopped"
        );
        stats
    }
}

/// Wire store, notifier, dispatcher and sweeper according to `config`
///
/// Must be called inside a tokio runtime.
///
/// # Returns
/// * `Ok(VerificationRuntime)` - Service ready to issue codes
/// * `Err(InfrastructureError::Config)` - Invalid configuration or unknown notifier
/// * `Err(InfrastructureError::Cache)` - Redis selected but unreachable
pub async fn build_verification_service(
    config: &AppConfig,
) -> Result<VerificationRuntime, InfrastructureError> {
    config.validate().map_err(InfrastructureError::Config)?;

    let grace_period = SweeperConfig::from(&config.verification).grace_period;
    let store: Arc<dyn CodeStore> = match config.cache.backend {
        StoreBackend::Memory => Arc::new(InMemoryCodeStore::new()),
        StoreBackend::Redis => Arc::new(RedisCodeStore::connect(&config.cache, grace_period).await?),
    };

    let notifier = build_notifier(config)?;
    let dispatcher = NotificationDispatcher::spawn(
        store.clone(),
        notifier,
        DispatcherConfig::from(&config.notification),
    );

    // Redis expires keys on its own
    let sweeper = match config.cache.backend {
        StoreBackend::Memory => Arc::new(CodeSweeper::new(
            store.clone(),
            SweeperConfig::from(&config.verification),
        ))
        .start_background_task(),
        StoreBackend::Redis => None,
    };

    let service = VerificationService::new(
        store.clone(),
        dispatcher,
        VerificationServiceConfig::from(&config.verification),
    );

    info!(
        environment = %config.environment,
        backend = ?config.cache.backend,
        notifier = %config.notification.provider,
        ttl_minutes = config.verification.code_ttl_minutes,
        "Verification service initialised"
    );

    Ok(VerificationRuntime {
        service,
        store,
        sweeper,
    })
}

fn build_notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>, InfrastructureError> {
    match config.notification.provider.as_str() {
        "log" => Ok(Arc::new(LogNotifier::from_config(&config.notification))),
        other => Err(InfrastructureError::Config(format!(
            "Unknown notifier provider: {}",
            other
        ))),
    }
}
