//! Verification service module for email-based codes
//!
//! This module provides the complete verification code workflow:
//! - Code generation and storage, one active code per subject and purpose
//! - Single-use redemption with expiry
//! - Non-blocking email dispatch with bounded retries
//! - Periodic eviction of expired records

mod config;
mod dispatcher;
mod service;
mod sweeper;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::{DispatcherConfig, SweeperConfig, VerificationServiceConfig};
pub use dispatcher::NotificationDispatcher;
pub use service::VerificationService;
pub use sweeper::CodeSweeper;
pub use traits::{Notifier, TemplateVariables};
pub use types::{DispatchJob, DispatchStats, IssuedCode, RedeemOutcome};
