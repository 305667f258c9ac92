//! Verification and delivery error types with bilingual messages
//!
//! Messages carry English and French text separated by ` | `, matching the
//! languages of the PolluAlert front end.

use pv_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Redemption failures a user can act on (request a new code, retype, ...)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("No verification code was requested | Aucun code de vérification n'a été demandé")]
    NotFound,

    #[error("Invalid verification code | Code de vérification invalide")]
    Invalid,

    #[error("Verification code expired | Le code de vérification a expiré")]
    Expired,

    #[error("Verification code already used | Le code de vérification a déjà été utilisé")]
    AlreadyUsed,
}

impl VerificationError {
    /// Stable code for the request layer
    pub fn error_code(&self) -> &'static str {
        match self {
            VerificationError::NotFound => error_codes::VERIFICATION_CODE_NOT_FOUND,
            VerificationError::Invalid => error_codes::VERIFICATION_CODE_INVALID,
            VerificationError::Expired => error_codes::VERIFICATION_CODE_EXPIRED,
            VerificationError::AlreadyUsed => error_codes::VERIFICATION_CODE_ALREADY_USED,
        }
    }

    /// Whether the client should be prompted to request a fresh code
    pub fn needs_new_code(&self) -> bool {
        !matches!(self, VerificationError::Invalid)
    }
}

impl IntoErrorResponse for VerificationError {
    fn to_error_response(&self) -> ErrorResponse {
        let status = match self {
            VerificationError::NotFound => 404,
            VerificationError::Expired => 410,
            VerificationError::AlreadyUsed => 409,
            VerificationError::Invalid => 400,
        };
        ErrorResponse::new(self.error_code(), self.to_string(), status)
            .add_detail("request_new_code", self.needs_new_code())
    }
}

/// Failures reported by a notifier when handing off an email
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Email delivery timed out | Délai d'envoi de l'email dépassé")]
    Timeout,

    #[error("Email rejected: {message} | Email refusé : {message}")]
    Rejected { message: String },

    #[error("Email transport failure: {message} | Échec de l'envoi de l'email : {message}")]
    Transport { message: String },

    #[error("Email queue is full | La file d'envoi des emails est pleine")]
    QueueFull,

    #[error("Email dispatcher has shut down | Le service d'envoi des emails est arrêté")]
    DispatcherClosed,
}

impl DeliveryError {
    /// Whether a later attempt may succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            DeliveryError::Rejected { .. } | DeliveryError::DispatcherClosed
        )
    }
}
