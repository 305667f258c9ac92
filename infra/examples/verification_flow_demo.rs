//! Walks through account verification and password reset
//!
//! Uses the backend selected by `CODE_STORE_BACKEND` (memory by default) and
//! the log notifier, so the emails show up in the console output.
//!
//! Run with: cargo run -p pv_infra --example verification_flow_demo

use anyhow::Context;
use chrono::{Duration, Utc};

use pv_core::domain::entities::verification_record::Purpose;
use pv_core::domain::value_objects::{PasswordResetRequest, VerifyAccountRequest};
use pv_infra::{build_verification_service, telemetry};
use pv_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    telemetry::init_tracing(&config.logging).context("initialising tracing")?;

    let runtime = build_verification_service(&config)
        .await
        .context("building verification service")?;
    let service = &runtime.service;

    println!("\n=== Account verification ===");
    let issued = service
        .issue_code_for_user("camille@example.org", "Camille", Purpose::VerifyAccount)
        .await?;
    println!("Issued code {} (expires {})", issued.code, issued.expires_at);

    let wrong = VerifyAccountRequest {
        email: "camille@example.org".to_string(),
        code: "not-it".to_string(),
    };
    println!("Wrong code      -> {:?}", service.verify_account(&wrong, Utc::now()).await?);

    let right = VerifyAccountRequest {
        code: issued.code.clone(),
        ..wrong
    };
    println!("Right code      -> {:?}", service.verify_account(&right, Utc::now()).await?);
    println!("Same code again -> {:?}", service.verify_account(&right, Utc::now()).await?);

    println!("\n=== Password reset ===");
    let first = service.issue_code("camille@example.org", Purpose::ResetPassword).await?;
    let resent = service.resend_code("camille@example.org", Purpose::ResetPassword).await?;
    println!("Resend reused the active code: {}", resent.reused);

    let late = first.expires_at + Duration::seconds(1);
    let request = PasswordResetRequest {
        email: "camille@example.org".to_string(),
        code: first.code.clone(),
        new_password: "nouveau-mot-de-passe".to_string(),
    };
    println!("After expiry    -> {:?}", service.redeem_password_reset(&request, late).await?);
    println!("In time         -> {:?}", service.redeem_password_reset(&request, Utc::now()).await?);

    let stats = runtime.shutdown().await;
    println!(
        "\nEmails delivered: {}, failed: {}, skipped: {}",
        stats.delivered, stats.failed, stats.superseded
    );
    Ok(())
}
