//! Challenge purposes and their per-purpose policy.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const RESET_TTL_SECONDS: i64 = 30 * 60;
const OTP_TTL_SECONDS: i64 = 5 * 60;
const RESEND_COOLDOWN_SECONDS: i64 = 60;

/// What a challenge proves control of an identifier *for*.
///
/// The purpose is stored alongside the digest and checked on consume, so a
/// live secret for one purpose can never validate another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Reset-link token embedded in a URL; the sole bearer credential.
    PasswordReset,
    /// Short numeric code sent to a pre-verified channel; unlocks the
    /// investing features of an account.
    OtpVerification,
}

impl Purpose {
    /// Column value for the `purpose` TEXT column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::OtpVerification => "otp_verification",
        }
    }

    /// How long a challenge of this purpose stays valid.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        match self {
            Self::PasswordReset => Duration::seconds(RESET_TTL_SECONDS),
            Self::OtpVerification => Duration::seconds(OTP_TTL_SECONDS),
        }
    }

    /// Minimum gap between issuances for the same subject. Enforced
    /// server-side; a client-side countdown is not a security control.
    #[must_use]
    pub fn resend_cooldown(&self) -> Duration {
        Duration::seconds(RESEND_COOLDOWN_SECONDS)
    }
}
