//! Verification record entity for email-based account verification and password reset.

use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pv_shared::email::normalize_email;

/// Length of the verification code
pub const CODE_LENGTH: usize = 6;

/// Exclusive upper bound of the numeric code space
const CODE_SPACE: u32 = 1_000_000;

/// Which flow a code was issued for. Codes never redeem across purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Confirm ownership of the address after registration
    VerifyAccount,
    /// Authorize setting a new password
    ResetPassword,
}

impl Purpose {
    /// Every purpose, in declaration order
    pub const ALL: [Purpose; 2] = [Purpose::VerifyAccount, Purpose::ResetPassword];

    /// Stable identifier used in storage keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::VerifyAccount => "verify_account",
            Purpose::ResetPassword => "reset_password",
        }
    }

    /// Email template rendered by the notifier
    pub fn template_name(&self) -> &'static str {
        match self {
            Purpose::VerifyAccount => "verification-email",
            Purpose::ResetPassword => "reset-password-email",
        }
    }

    /// Subject line of the outgoing email
    pub fn email_subject(&self) -> &'static str {
        match self {
            Purpose::VerifyAccount => "Vérification de votre compte PolluAlert",
            Purpose::ResetPassword => "Réinitialisation de votre mot de passe PolluAlert",
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Purpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify_account" => Ok(Purpose::VerifyAccount),
            "reset_password" => Ok(Purpose::ResetPassword),
            _ => Err(format!("Unknown verification purpose: {}", s)),
        }
    }
}

/// An issued verification code and its lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Identity of this issuance; a re-issue for the same key gets a new id
    pub id: Uuid,

    /// Normalized email address the code was sent to
    pub subject: String,

    /// Flow the code is valid for
    pub purpose: Purpose,

    /// The 6-digit verification code
    pub code: String,

    /// Timestamp when the code was issued
    pub issued_at: DateTime<Utc>,

    /// Timestamp after which the code no longer redeems
    pub expires_at: DateTime<Utc>,

    /// Whether the code has been redeemed
    pub consumed: bool,
}

impl VerificationRecord {
    /// Issues a fresh record with a random code
    ///
    /// # Arguments
    ///
    /// * `subject` - Email address; normalized before storing
    /// * `purpose` - Flow the code is valid for
    /// * `ttl` - Validity window starting at `now`
    /// * `now` - Issuance time
    pub fn issue(subject: &str, purpose: Purpose, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self::with_code(subject, purpose, Self::generate_code(), ttl, now)
    }

    /// Builds a record around a known code
    pub fn with_code(
        subject: &str,
        purpose: Purpose,
        code: String,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: normalize_email(subject),
            purpose,
            code,
            issued_at: now,
            expires_at: now + ttl,
            consumed: false,
        }
    }

    /// Generates a uniformly distributed, zero-padded 6-digit code from the OS CSPRNG
    pub fn generate_code() -> String {
        let code: u32 = OsRng.gen_range(0..CODE_SPACE);
        format!("{:0width$}", code, width = CODE_LENGTH)
    }

    /// Checks whether `candidate` has the shape of a code
    pub fn is_well_formed(candidate: &str) -> bool {
        candidate.len() == CODE_LENGTH && candidate.chars().all(|c| c.is_ascii_digit())
    }

    /// `true` once `now` is strictly past `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Unconsumed and unexpired
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired_at(now)
    }

    /// Whether the record may be evicted, given a retention grace period after expiry
    pub fn is_evictable_at(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        now > self.expires_at + grace
    }

    /// Compares `candidate` with the stored code in constant time
    pub fn matches(&self, candidate: &str) -> bool {
        if candidate.len() != self.code.len() {
            return false;
        }
        constant_time_eq(self.code.as_bytes(), candidate.as_bytes())
    }

    /// Time remaining until expiration, or zero if expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Duration {
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }

    /// Marks the record as redeemed; returns `false` if it already was
    pub fn consume(&mut self) -> bool {
        if self.consumed {
            return false;
        }
        self.consumed = true;
        true
    }
}
