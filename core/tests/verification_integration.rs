//! Integration tests for the verification service through the public API

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::{Arc, Mutex};

use pv_core::domain::entities::verification_record::Purpose;
use pv_core::errors::{DeliveryError, VerificationError};
use pv_core::repositories::InMemoryCodeStore;
use pv_core::services::verification::{
    DispatcherConfig, NotificationDispatcher, Notifier, RedeemOutcome, TemplateVariables,
    VerificationService, VerificationServiceConfig,
};
use pv_shared::errors::{error_codes, IntoErrorResponse};

// Mock notifier keeping (recipient, template, code)
#[derive(Default)]
struct Outbox {
    messages: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl Notifier for Outbox {
    async fn send(
        &self,
        recipient: &str,
        template_name: &str,
        variables: &TemplateVariables,
    ) -> Result<(), DeliveryError> {
        let code = variables["code"].as_str().unwrap_or_default().to_string();
        self.messages
            .lock()
            .unwrap()
            .push((recipient.to_string(), template_name.to_string(), code));
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "outbox"
    }
}

fn service(outbox: Arc<Outbox>) -> VerificationService<InMemoryCodeStore> {
    let store = Arc::new(InMemoryCodeStore::new());
    let dispatcher = NotificationDispatcher::spawn(store.clone(), outbox, DispatcherConfig::default());
    VerificationService::new(store, dispatcher, VerificationServiceConfig::default())
}

#[tokio::test]
async fn test_both_flows_are_independent() {
    let outbox = Arc::new(Outbox::default());
    let service = service(outbox.clone());
    let email = "lea@example.fr";

    let account = service.issue_code(email, Purpose::VerifyAccount).await.unwrap();
    let reset = service.issue_code(email, Purpose::ResetPassword).await.unwrap();

    let outcome = service
        .redeem_now(email, Purpose::ResetPassword, &reset.code)
        .await
        .unwrap();
    assert_eq!(outcome, RedeemOutcome::Ok);

    // The account code is untouched by the reset redemption
    let outcome = service
        .redeem_now(email, Purpose::VerifyAccount, &account.code)
        .await
        .unwrap();
    assert_eq!(outcome, RedeemOutcome::Ok);

    service.shutdown().await;
    let messages = outbox.messages.lock().unwrap().clone();
    assert_eq!(messages.len(), 2);
    assert!(messages
        .iter()
        .any(|(_, template, _)| template == "verification-email"));
    assert!(messages
        .iter()
        .any(|(_, template, _)| template == "reset-password-email"));
}

#[tokio::test]
async fn test_outcomes_map_to_error_responses() {
    let service = service(Arc::new(Outbox::default()));
    let email = "hugo@example.fr";
    let issued = service.issue_code(email, Purpose::VerifyAccount).await.unwrap();

    let expired = service
        .redeem(
            email,
            Purpose::VerifyAccount,
            &issued.code,
            issued.expires_at + Duration::seconds(1),
        )
        .await
        .unwrap();
    let err = expired.into_result().unwrap_err();
    assert_eq!(err, VerificationError::Expired);

    let response = err.to_error_response();
    assert_eq!(response.error, error_codes::VERIFICATION_CODE_EXPIRED);
    assert!(response.is_client_error());

    let ok = service
        .redeem(email, Purpose::VerifyAccount, &issued.code, Utc::now())
        .await
        .unwrap();
    assert!(ok.into_result().is_ok());

    let used = service
        .redeem(email, Purpose::VerifyAccount, &issued.code, Utc::now())
        .await
        .unwrap();
    let response = used.into_result().unwrap_err().to_error_response();
    assert_eq!(response.error, error_codes::VERIFICATION_CODE_ALREADY_USED);
}
