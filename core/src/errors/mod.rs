//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::{DeliveryError, VerificationError};

use pv_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use pv_shared::validation::ValidationErrors;
use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation failed: {errors} | Validation échouée")]
    Validation { errors: ValidationErrors },

    #[error("Storage unavailable: {message} | Stockage indisponible")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl DomainError {
    /// Shorthand for a storage failure
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Storage {
            message: message.into(),
        }
    }

    /// Whether the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Storage { .. })
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        DomainError::Validation { errors }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            DomainError::Validation { errors } => ErrorResponse::new(
                error_codes::VALIDATION_ERROR,
                "Validation failed | Validation échouée",
                400,
            )
            .add_detail("fields", errors.to_field_errors()),
            DomainError::Storage { .. } => ErrorResponse::new(
                error_codes::STORAGE_ERROR,
                "Service temporarily unavailable | Service temporairement indisponible",
                503,
            ),
            DomainError::Internal { .. } => ErrorResponse::new(
                error_codes::INTERNAL_ERROR,
                "Internal server error | Erreur interne du serveur",
                500,
            ),
            DomainError::Verification(err) => err.to_error_response(),
            DomainError::Delivery(err) => {
                ErrorResponse::new(error_codes::DELIVERY_ERROR, err.to_string(), 502)
            }
        }
    }
}

impl From<&DomainError> for ErrorResponse {
    fn from(error: &DomainError) -> Self {
        error.to_error_response()
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
