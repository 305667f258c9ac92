//! # Pollu Verify Core
//!
//! Core business logic for issuing and redeeming single-use verification codes.
//! This crate contains the verification record entity, request validation,
//! the code store contract, the notifier contract and the verification service.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
