//! Periodic eviction of expired verification records

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::DomainResult;
use crate::repositories::CodeStore;

use super::config::SweeperConfig;

/// Removes records once they are past expiry plus the grace period
pub struct CodeSweeper<S: CodeStore + ?Sized + 'static> {
    store: Arc<S>,
    config: SweeperConfig,
}

impl<S: CodeStore + ?Sized + 'static> CodeSweeper<S> {
    /// Create a new sweeper
    pub fn new(store: Arc<S>, config: SweeperConfig) -> Self {
        Self { store, config }
    }

    /// Run a single sweep as of `now`
    ///
    /// # Returns
    /// * `Ok(count)` - Number of records evicted
    /// * `Err(DomainError)` - If the store is unavailable
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let cutoff = now - self.config.grace_period;
        let purged = self.store.purge_expired(cutoff).await?;
        if purged > 0 {
            info!(purged = purged, cutoff = %cutoff, "Evicted expired verification records");
        } else {
            debug!(cutoff = %cutoff, "No expired verification records to evict");
        }
        Ok(purged)
    }

    /// Start the sweeper as a background task
    ///
    /// Returns `None` when sweeping is disabled in the configuration.
    pub fn start_background_task(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Verification record sweeper is disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            info!(
                "Verification record sweeper started - will run every {} seconds",
                self.config.interval.as_secs()
            );

            let mut interval_timer = tokio::time::interval(self.config.interval);

            loop {
                interval_timer.tick().await;

                if let Err(e) = self.run_sweep(Utc::now()).await {
                    error!("Verification record sweep failed: {}", e);
                }
            }
        }))
    }
}
