//! Types for verification service results

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::verification_record::Purpose;
use crate::errors::VerificationError;

use super::traits::TemplateVariables;

/// Result of issuing (or resending) a code
#[derive(Debug, Clone)]
pub struct IssuedCode {
    /// Identity of the stored record
    pub record_id: Uuid,
    /// Normalized subject the code belongs to
    pub subject: String,
    /// Flow the code is valid for
    pub purpose: Purpose,
    /// The code itself; production callers discard it
    pub code: String,
    /// When the code stops redeeming
    pub expires_at: DateTime<Utc>,
    /// Whether the email was handed to the dispatcher
    pub dispatch_queued: bool,
    /// `true` when a resend re-used a still-active code
    pub reused: bool,
}

/// Outcome of a redemption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Code accepted and consumed
    Ok,
    /// Wrong code, or a code superseded by a newer one
    Invalid,
    /// Right code, too late
    Expired,
    /// The code has already been redeemed
    AlreadyUsed,
    /// No code is outstanding for the subject and purpose
    NotFound,
}

impl RedeemOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, RedeemOutcome::Ok)
    }

    /// Convert into a `Result` for callers that propagate with `?`
    pub fn into_result(self) -> Result<(), VerificationError> {
        match self {
            RedeemOutcome::Ok => Ok(()),
            RedeemOutcome::Invalid => Err(VerificationError::Invalid),
            RedeemOutcome::Expired => Err(VerificationError::Expired),
            RedeemOutcome::AlreadyUsed => Err(VerificationError::AlreadyUsed),
            RedeemOutcome::NotFound => Err(VerificationError::NotFound),
        }
    }

    /// Label used in structured logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RedeemOutcome::Ok => "ok",
            RedeemOutcome::Invalid => "invalid",
            RedeemOutcome::Expired => "expired",
            RedeemOutcome::AlreadyUsed => "already_used",
            RedeemOutcome::NotFound => "not_found",
        }
    }
}

/// One email waiting in the dispatch queue
#[derive(Debug, Clone)]
pub struct DispatchJob {
    /// Record the email announces; stale jobs are dropped
    pub record_id: Uuid,
    /// Normalized subject, also the recipient address
    pub recipient: String,
    /// Selects the template
    pub purpose: Purpose,
    /// Template variables
    pub variables: TemplateVariables,
}

/// Counters maintained by the dispatcher worker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Emails accepted by the notifier
    pub delivered: u64,
    /// Emails given up on after the retry budget
    pub failed: u64,
    /// Jobs dropped because their record was replaced, redeemed or expired
    pub superseded: u64,
}

impl DispatchStats {
    /// Jobs the worker has finished with, whatever the result
    pub fn processed(&self) -> u64 {
        self.delivered + self.failed + self.superseded
    }
}
