//! Business services containing domain logic and use cases.

pub mod verification;

// Re-export commonly used types
pub use verification::{
    CodeSweeper, DispatcherConfig, IssuedCode, NotificationDispatcher, Notifier, RedeemOutcome,
    SweeperConfig, TemplateVariables, VerificationService, VerificationServiceConfig,
};
