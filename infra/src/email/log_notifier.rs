//! Logging email notifier
//!
//! Writes every verification email to the tracing output instead of handing
//! it to a mail relay.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use pv_core::errors::DeliveryError;
use pv_core::services::verification::{Notifier, TemplateVariables};
use pv_shared::config::NotificationConfig;
use pv_shared::email::mask_email;

/// Notifier that logs emails and counts them
///
/// The recipient is masked in every log line. The code itself only shows up
/// at debug level.
#[derive(Clone)]
pub struct LogNotifier {
    /// Sender address shown in the log
    from_address: String,
    /// Counter for tracking number of emails sent
    message_count: Arc<AtomicU64>,
    /// Whether to simulate failures (for testing)
    simulate_failure: Arc<AtomicBool>,
}

impl LogNotifier {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
            message_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(config.from_address.clone())
    }

    /// Get the total number of emails sent
    pub fn message_count(&self) -> u64 {
        self.message_count.load(Ordering::SeqCst)
    }

    /// Enable or disable failure simulation
    pub fn set_simulate_failure(&self, simulate: bool) {
        self.simulate_failure.store(simulate, Ordering::SeqCst);
    }
}

impl Default for LogNotifier {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        variables: &TemplateVariables,
    ) -> Result<(), DeliveryError> {
        let masked = mask_email(recipient);

        if self.simulate_failure.load(Ordering::SeqCst) {
            warn!(recipient = %masked, "Log notifier simulating delivery failure");
            return Err(DeliveryError::Transport {
                message: "Simulated email delivery failure".to_string(),
            });
        }

        let count = self.message_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            target: "email_service",
            provider = "log",
            from = %self.from_address,
            recipient = %masked,
            template = template_name,
            message_number = count,
            "Verification email sent (log)"
        );
        debug!(
            target: "email_service",
            recipient = %masked,
            variables = ?variables,
            "Verification email variables"
        );

        Ok(())
    }

    fn provider_name(&self) -> &str {
        "log"
    }
}
