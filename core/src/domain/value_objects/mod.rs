//! Value objects carried into the domain from the request layer.

pub mod account_requests;

pub use account_requests::{
    CodeRequest, PasswordResetRequest, ProfileUpdateRequest, VerifyAccountRequest,
    PASSWORD_MIN_LENGTH, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
};
