//! Main verification service implementation

use chrono::{DateTime, Utc};
use std::sync::Arc;

use pv_shared::email::{local_part, mask_email, normalize_email};
use pv_shared::validation::{validators, Validate, ValidationErrors};

use crate::domain::entities::verification_record::{Purpose, VerificationRecord};
use crate::domain::value_objects::{PasswordResetRequest, VerifyAccountRequest};
use crate::errors::{DomainError, DomainResult};
use crate::repositories::CodeStore;

use super::config::VerificationServiceConfig;
use super::dispatcher::NotificationDispatcher;
use super::traits::TemplateVariables;
use super::types::{DispatchJob, DispatchStats, IssuedCode, RedeemOutcome};

/// Verification service issuing and redeeming single-use email codes
pub struct VerificationService<S: CodeStore + ?Sized> {
    /// Store holding outstanding codes
    store: Arc<S>,
    /// Queue towards the email notifier
    dispatcher: NotificationDispatcher,
    /// Service configuration
    config: VerificationServiceConfig,
}

impl<S: CodeStore + ?Sized> VerificationService<S> {
    /// Create a new verification service
    ///
    /// # Arguments
    ///
    /// * `store` - Code store implementation
    /// * `dispatcher` - Dispatcher wrapping the email notifier
    /// * `config` - Service configuration
    pub fn new(
        store: Arc<S>,
        dispatcher: NotificationDispatcher,
        config: VerificationServiceConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            config,
        }
    }

    /// Issue a new code and queue the email announcing it
    ///
    /// Any outstanding code for the same subject and purpose stops redeeming.
    /// The display name in the email defaults to the local part of the address.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedCode)` - The stored code; delivery happens in the background
    /// * `Err(DomainError::Validation)` - The subject is not an email address
    /// * `Err(DomainError::Storage)` - The store rejected the write
    pub async fn issue_code(&self, subject: &str, purpose: Purpose) -> DomainResult<IssuedCode> {
        self.issue(subject, None, purpose).await
    }

    /// Same as [`issue_code`](Self::issue_code) with an explicit display name
    pub async fn issue_code_for_user(
        &self,
        subject: &str,
        username: &str,
        purpose: Purpose,
    ) -> DomainResult<IssuedCode> {
        self.issue(subject, Some(username), purpose).await
    }

    /// Send the outstanding code again, or issue one if none is active
    ///
    /// A still-valid code is re-sent unchanged, so a resend never invalidates
    /// the code the user may already be typing.
    pub async fn resend_code(&self, subject: &str, purpose: Purpose) -> DomainResult<IssuedCode> {
        let subject = Self::normalize_subject(subject)?;

        match self.active_record(&subject, purpose, Utc::now()).await? {
            Some(record) => {
                tracing::info!(
                    subject = %mask_email(&subject),
                    purpose = %purpose,
                    record_id = %record.id,
                    event = "otp_resent",
                    "Re-sending active verification code"
                );
                let dispatch_queued = self.dispatch(&record, None);
                Ok(Self::issued(record, dispatch_queued, true))
            }
            None => self.issue(&subject, None, purpose).await,
        }
    }

    /// Redeem `candidate` for the subject and purpose as of `now`
    ///
    /// Checks run in a fixed order: missing record, already consumed, expired,
    /// wrong code. A matching code is consumed through the store's atomic
    /// compare-and-swap, so concurrent redemptions of one code yield a single
    /// `RedeemOutcome::Ok`. Consumed records are kept until eviction and keep
    /// answering `AlreadyUsed`.
    ///
    /// # Returns
    ///
    /// * `Ok(RedeemOutcome)` - The typed outcome, including user errors
    /// * `Err(DomainError::Storage)` - The store is unavailable
    pub async fn redeem(
        &self,
        subject: &str,
        purpose: Purpose,
        candidate: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<RedeemOutcome> {
        let subject = normalize_email(subject);
        let candidate = candidate.trim();

        let record = match self.store.get(&subject, purpose).await? {
            Some(record) => record,
            None => return Ok(self.log_outcome(&subject, purpose, RedeemOutcome::NotFound)),
        };

        if record.consumed {
            return Ok(self.log_outcome(&subject, purpose, RedeemOutcome::AlreadyUsed));
        }
        if record.is_expired_at(now) {
            return Ok(self.log_outcome(&subject, purpose, RedeemOutcome::Expired));
        }
        if !record.matches(candidate) {
            return Ok(self.log_outcome(&subject, purpose, RedeemOutcome::Invalid));
        }

        if self.store.mark_consumed(&subject, purpose, record.id).await? {
            return Ok(self.log_outcome(&subject, purpose, RedeemOutcome::Ok));
        }

        // Lost the race: find out to what
        let outcome = match self.store.get(&subject, purpose).await? {
            Some(current) if current.id == record.id => RedeemOutcome::AlreadyUsed,
            Some(_) => RedeemOutcome::Invalid,
            None => RedeemOutcome::NotFound,
        };
        Ok(self.log_outcome(&subject, purpose, outcome))
    }

    /// [`redeem`](Self::redeem) at the current time
    pub async fn redeem_now(
        &self,
        subject: &str,
        purpose: Purpose,
        candidate: &str,
    ) -> DomainResult<RedeemOutcome> {
        self.redeem(subject, purpose, candidate, Utc::now()).await
    }

    /// Validate a password reset submission and redeem its code
    ///
    /// On `RedeemOutcome::Ok` the caller may store `request.new_password`.
    pub async fn redeem_password_reset(
        &self,
        request: &PasswordResetRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<RedeemOutcome> {
        request.validate()?;
        self.redeem(&request.email, Purpose::ResetPassword, &request.code, now)
            .await
    }

    /// Validate an account verification submission and redeem its code
    pub async fn verify_account(
        &self,
        request: &VerifyAccountRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<RedeemOutcome> {
        request.validate()?;
        self.redeem(&request.email, Purpose::VerifyAccount, &request.code, now)
            .await
    }

    /// Drop any outstanding code, e.g. when the user changes address or abandons a reset
    pub async fn cancel(&self, subject: &str, purpose: Purpose) -> DomainResult<()> {
        let subject = normalize_email(subject);
        tracing::info!(
            subject = %mask_email(&subject),
            purpose = %purpose,
            event = "otp_cancelled",
            "Cancelling outstanding verification code"
        );
        self.store.delete(&subject, purpose).await
    }

    /// The record for the key if it can still be redeemed at `now`
    pub async fn active_record(
        &self,
        subject: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<VerificationRecord>> {
        let subject = normalize_email(subject);
        Ok(self
            .store
            .get(&subject, purpose)
            .await?
            .filter(|record| record.is_active_at(now)))
    }

    /// Dispatcher counters
    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Stop the dispatcher after draining queued emails
    pub async fn shutdown(self) -> DispatchStats {
        self.dispatcher.shutdown().await
    }

    async fn issue(
        &self,
        subject: &str,
        username: Option<&str>,
        purpose: Purpose,
    ) -> DomainResult<IssuedCode> {
        let subject = Self::normalize_subject(subject)?;
        let record = VerificationRecord::issue(&subject, purpose, self.config.code_ttl(), Utc::now());

        self.store
            .put(&subject, purpose, record.clone())
            .await
            .map_err(|e| {
                tracing::error!(
                    subject = %mask_email(&subject),
                    purpose = %purpose,
                    error = %e,
                    event = "otp_storage_failed",
                    "Failed to store verification code"
                );
                e
            })?;

        tracing::info!(
            subject = %mask_email(&subject),
            purpose = %purpose,
            record_id = %record.id,
            expires_at = %record.expires_at,
            event = "otp_generated",
            "Generated new verification code"
        );

        let dispatch_queued = self.dispatch(&record, username);
        Ok(Self::issued(record, dispatch_queued, false))
    }

    /// Hand the email to the dispatcher; failures are logged, never propagated
    fn dispatch(&self, record: &VerificationRecord, username: Option<&str>) -> bool {
        let job = DispatchJob {
            record_id: record.id,
            recipient: record.subject.clone(),
            purpose: record.purpose,
            variables: self.template_variables(record, username),
        };

        match self.dispatcher.enqueue(job) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    subject = %mask_email(&record.subject),
                    purpose = %record.purpose,
                    error = %e,
                    event = "notification_enqueue_failed",
                    "Could not queue verification email; code remains valid"
                );
                false
            }
        }
    }

    fn template_variables(&self, record: &VerificationRecord, username: Option<&str>) -> TemplateVariables {
        let username = username
            .map(str::to_string)
            .unwrap_or_else(|| local_part(&record.subject).to_string());

        let mut variables = TemplateVariables::new();
        variables.insert("username".to_string(), serde_json::json!(username));
        variables.insert("code".to_string(), serde_json::json!(record.code));
        variables.insert(
            "subject".to_string(),
            serde_json::json!(record.purpose.email_subject()),
        );
        variables.insert(
            "expiryMinutes".to_string(),
            serde_json::json!(self.config.code_ttl_minutes),
        );
        variables
    }

    fn normalize_subject(subject: &str) -> DomainResult<String> {
        let subject = normalize_email(subject);
        if !validators::is_valid_email(&subject) {
            let mut errors = ValidationErrors::new();
            errors.add_error("email", "Invalid email format | Format d'email invalide", "email");
            return Err(DomainError::from(errors));
        }
        Ok(subject)
    }

    fn issued(record: VerificationRecord, dispatch_queued: bool, reused: bool) -> IssuedCode {
        IssuedCode {
            record_id: record.id,
            subject: record.subject,
            purpose: record.purpose,
            code: record.code,
            expires_at: record.expires_at,
            dispatch_queued,
            reused,
        }
    }

    fn log_outcome(&self, subject: &str, purpose: Purpose, outcome: RedeemOutcome) -> RedeemOutcome {
        if outcome.is_ok() {
            tracing::info!(
                subject = %mask_email(subject),
                purpose = %purpose,
                event = "otp_verified_success",
                "Verification code redeemed"
            );
        } else {
            tracing::warn!(
                subject = %mask_email(subject),
                purpose = %purpose,
                outcome = outcome.as_str(),
                event = "otp_verification_failed",
                "Verification code rejected"
            );
        }
        outcome
    }
}
