//! Trait for the email notification collaborator

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::DeliveryError;

/// Variables handed to the email template
pub type TemplateVariables = HashMap<String, serde_json::Value>;

/// Sends templated emails on behalf of the verification service
///
/// Implementations render `template_name` with `variables` and hand the result
/// to a mail relay. They are called from the dispatcher task, never from the
/// request path.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one email
    ///
    /// # Arguments
    ///
    /// * `recipient` - Destination email address
    /// * `template_name` - `"verification-email"` or `"reset-password-email"`
    /// * `variables` - `username`, `code` and `expiryMinutes`
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        variables: &TemplateVariables,
    ) -> Result<(), DeliveryError>;

    /// Provider name used in logs
    fn provider_name(&self) -> &str;
}
