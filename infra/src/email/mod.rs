//! Email notifier implementations
//!
//! Delivery through a real relay is outside this crate; `LogNotifier` stands in
//! for it in development and tests.

pub mod log_notifier;

pub use log_notifier::LogNotifier;
