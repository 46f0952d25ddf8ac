//! Out-of-band delivery of challenge secrets.
//!
//! The notifier is an explicitly passed collaborator, never a process-wide
//! transporter instance, so issuance is testable with a substitute and a
//! deployment can swap transports without touching the issuer.

use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::challenge::error::DeliveryError;
use crate::challenge::purpose::Purpose;

/// One rendered message, ready for a transport.
#[derive(Clone, Debug)]
pub struct Notice {
    pub subject: String,
    pub body: String,
}

impl Notice {
    /// Render the purpose's message around the plaintext secret. This is the
    /// one place the plaintext leaves its wrapper on the issuance path.
    #[must_use]
    pub fn compose(purpose: Purpose, secret: &SecretString, base_url: &str) -> Self {
        match purpose {
            Purpose::PasswordReset => Self {
                subject: "Reset your password".to_string(),
                body: format!(
                    "A password reset was requested for your account.\n\n\
                     Use this link within 30 minutes: {}\n\n\
                     If you did not request it, you can ignore this message.",
                    reset_url(base_url, secret.expose_secret())
                ),
            },
            Purpose::OtpVerification => Self {
                subject: "Your verification code".to_string(),
                body: format!(
                    "Your verification code is {}. It expires in 5 minutes.",
                    secret.expose_secret()
                ),
            },
        }
    }
}

/// Build the reset link embedded in outbound mail. The token rides in the
/// fragment so it never appears in server-side request logs.
fn reset_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}/reset-password#token={token}")
}

pub trait Notifier: Send + Sync {
    /// Deliver one message. Best-effort; the issuer decides what a failure
    /// means for the challenge it belongs to.
    fn send(&self, destination: &str, notice: &Notice) -> Result<(), DeliveryError>;
}

/// Logs instead of delivering. Default wiring until a real transport is
/// configured; the secret itself is not logged.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, destination: &str, notice: &Notice) -> Result<(), DeliveryError> {
        info!(
            destination = %destination,
            subject = %notice.subject,
            "notifier send stub"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LogNotifier, Notice, Notifier};
    use crate::challenge::purpose::Purpose;
    use secrecy::SecretString;

    #[test]
    fn reset_notice_links_token_in_fragment() {
        let secret = SecretString::from("deadbeef".to_string());
        let notice = Notice::compose(Purpose::PasswordReset, &secret, "https://bank.example/");
        assert_eq!(notice.subject, "Reset your password");
        assert!(notice
            .body
            .contains("https://bank.example/reset-password#token=deadbeef"));
    }

    #[test]
    fn otp_notice_carries_the_code() {
        let secret = SecretString::from("482913".to_string());
        let notice = Notice::compose(Purpose::OtpVerification, &secret, "https://bank.example");
        assert_eq!(notice.subject, "Your verification code");
        assert!(notice.body.contains("482913"));
    }

    #[test]
    fn log_notifier_accepts() {
        let notice = Notice {
            subject: "s".to_string(),
            body: "b".to_string(),
        };
        assert!(LogNotifier.send("user@example.com", &notice).is_ok());
    }
}
