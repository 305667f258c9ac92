//! Request payloads for the verification and password-reset flows.
//!
//! Each payload validates itself and reports field-level errors with bilingual
//! (English | French) messages before any code is issued or redeemed.

use serde::{Deserialize, Serialize};

use pv_shared::validation::{validators, Validate, ValidationErrors};

/// Minimum username length in characters
pub const USERNAME_MIN_LENGTH: usize = 3;

/// Maximum username length in characters
pub const USERNAME_MAX_LENGTH: usize = 50;

/// Minimum length of a newly chosen password
pub const PASSWORD_MIN_LENGTH: usize = 6;

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !validators::not_blank(email) {
        errors.add_error("email", "Email is required | L'email est requis", "required");
    } else if !validators::is_valid_email(email) {
        errors.add_error("email", "Invalid email format | Format d'email invalide", "email");
    }
}

fn check_code(errors: &mut ValidationErrors, code: &str) {
    if !validators::not_blank(code) {
        errors.add_error("code", "Code is required | Le code est requis", "required");
    }
}

/// Request to issue or resend a code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRequest {
    pub email: String,
}

impl Validate for CodeRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        errors.into_result()
    }
}

/// Account verification submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyAccountRequest {
    pub email: String,
    pub code: String,
}

impl Validate for VerifyAccountRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        check_code(&mut errors, &self.code);
        errors.into_result()
    }
}

/// Password reset submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

impl Validate for PasswordResetRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        check_code(&mut errors, &self.code);
        if !validators::not_blank(&self.new_password) {
            errors.add_error(
                "newPassword",
                "New password is required | Le nouveau mot de passe est requis",
                "required",
            );
        }
        errors.into_result()
    }
}

/// Profile update submission
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub username: String,
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

impl Validate for ProfileUpdateRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !validators::not_blank(&self.username) {
            errors.add_error(
                "username",
                "Username must not be blank | Le nom d'utilisateur ne peut pas être vide",
                "required",
            );
        }
        if !validators::length_between(&self.username, USERNAME_MIN_LENGTH, USERNAME_MAX_LENGTH) {
            errors.add_error(
                "username",
                "Username must be between 3 and 50 characters | Le nom d'utilisateur doit contenir entre 3 et 50 caractères",
                "length",
            );
        }
        if let Some(new_password) = &self.new_password {
            if !validators::min_length(new_password, PASSWORD_MIN_LENGTH) {
                errors.add_error(
                    "newPassword",
                    "New password must be at least 6 characters | Le nouveau mot de passe doit contenir au moins 6 caractères",
                    "length",
                );
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_valid() {
        let request = PasswordResetRequest {
            email: "a@x.com".to_string(),
            code: "042913".to_string(),
            new_password: "hunter22".to_string(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_password_reset_reports_every_field() {
        let request = PasswordResetRequest {
            email: "nope".to_string(),
            code: " ".to_string(),
            new_password: String::new(),
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 3);
        assert!(errors.has_field("email"));
        assert!(errors.has_field("code"));
        assert!(errors.has_field("newPassword"));
        assert!(errors.errors()[0].message.contains("Format d'email invalide"));
    }

    #[test]
    fn test_blank_email_is_required_not_malformed() {
        let request = CodeRequest { email: "   ".to_string() };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].code, "required");
    }

    #[test]
    fn test_verify_account_request() {
        let ok = VerifyAccountRequest {
            email: "a@x.com".to_string(),
            code: "123456".to_string(),
        };
        assert!(ok.validate().is_ok());

        let missing_code = VerifyAccountRequest {
            email: "a@x.com".to_string(),
            code: String::new(),
        };
        assert!(missing_code.validate().unwrap_err().has_field("code"));
    }

    #[test]
    fn test_profile_update_username_bounds() {
        let short = ProfileUpdateRequest {
            username: "ab".to_string(),
            current_password: None,
            new_password: None,
        };
        assert!(short.validate().unwrap_err().has_field("username"));

        let long = ProfileUpdateRequest {
            username: "x".repeat(51),
            current_password: None,
            new_password: None,
        };
        assert!(long.validate().is_err());

        let blank = ProfileUpdateRequest {
            username: "    ".to_string(),
            current_password: None,
            new_password: None,
        };
        let errors = blank.validate().unwrap_err();
        assert!(errors.errors().iter().any(|e| e.code == "required"));
    }

    #[test]
    fn test_profile_update_password_optional() {
        let no_change = ProfileUpdateRequest {
            username: "amina".to_string(),
            current_password: None,
            new_password: None,
        };
        assert!(no_change.validate().is_ok());

        let weak = ProfileUpdateRequest {
            username: "amina".to_string(),
            current_password: Some("old-secret".to_string()),
            new_password: Some("12345".to_string()),
        };
        assert!(weak.validate().unwrap_err().has_field("newPassword"));
    }

    #[test]
    fn test_camel_case_payload() {
        let json = r#"{"email":"a@x.com","code":"042913","newPassword":"s3cret!"}"#;
        let request: PasswordResetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.new_password, "s3cret!");

        let json = r#"{"username":"amina"}"#;
        let request: ProfileUpdateRequest = serde_json::from_str(json).unwrap();
        assert!(request.current_password.is_none());
    }
}
