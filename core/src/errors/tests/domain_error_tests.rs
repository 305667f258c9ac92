//! Unit tests for domain error types

use pv_shared::errors::{extract_english_message, extract_french_message, IntoErrorResponse};
use pv_shared::validation::ValidationErrors;

use crate::errors::{DeliveryError, DomainError, VerificationError};

#[test]
fn test_verification_error_messages() {
    let message = VerificationError::Expired.to_string();
    assert_eq!(extract_english_message(&message), "Verification code expired");
    assert_eq!(
        extract_french_message(&message),
        "Le code de vérification a expiré"
    );
}

#[test]
fn test_verification_error_responses_are_client_errors() {
    for error in [
        VerificationError::NotFound,
        VerificationError::Invalid,
        VerificationError::Expired,
        VerificationError::AlreadyUsed,
    ] {
        let response = error.to_error_response();
        assert!(response.is_client_error(), "{:?} should be 4xx", error);
        assert_eq!(response.error, error.error_code());
    }
}

#[test]
fn test_distinguishes_wrong_from_stale_codes() {
    assert!(!VerificationError::Invalid.needs_new_code());
    assert!(VerificationError::Expired.needs_new_code());
    assert!(VerificationError::AlreadyUsed.needs_new_code());

    let response = VerificationError::Expired.to_error_response();
    assert_eq!(
        response.details.unwrap()["request_new_code"],
        serde_json::json!(true)
    );
}

#[test]
fn test_storage_error_is_server_error() {
    let error = DomainError::storage("connection refused");
    assert!(error.is_retryable());
    let response = error.to_error_response();
    assert_eq!(response.status, 503);
    assert!(!response.message.contains("connection refused"));
}

#[test]
fn test_validation_error_carries_fields() {
    let mut errors = ValidationErrors::new();
    errors.add_error("email", "Email is required | L'email est requis", "required");
    let error: DomainError = errors.into();
    let response = error.to_error_response();
    assert_eq!(response.error, "VALIDATION_ERROR");
    assert!(response.details.unwrap().contains_key("fields"));
}

#[test]
fn test_delivery_error_retryability() {
    assert!(DeliveryError::Timeout.is_retryable());
    assert!(DeliveryError::Transport { message: "reset".into() }.is_retryable());
    assert!(!DeliveryError::Rejected { message: "mailbox unknown".into() }.is_retryable());
}

#[test]
fn test_verification_error_bridges_into_domain_error() {
    let error: DomainError = VerificationError::Invalid.into();
    assert!(matches!(error, DomainError::Verification(VerificationError::Invalid)));
    assert!(!error.is_retryable());
}
