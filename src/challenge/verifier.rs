//! Challenge verification.
//!
//! Verification is digest + consume-on-verify, nothing else. The verifier
//! has no idea how to mutate an account; on success the caller applies the
//! purpose effect through the user directory with the returned subject id.

use chrono::{DateTime, Utc};
use tracing::error;

use super::error::StoreError;
use super::models::VerifyOutcome;
use super::purpose::Purpose;
use super::secret;
use super::store::ChallengeStore;

#[derive(Clone)]
pub struct ChallengeVerifier<S> {
    store: S,
}

impl<S: ChallengeStore> ChallengeVerifier<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Check a presented secret and consume its challenge in one step.
    ///
    /// Expired, consumed, superseded, and unknown secrets all come back as
    /// [`VerifyOutcome::InvalidOrExpired`]; callers learn nothing else.
    pub async fn verify(
        &self,
        presented: &str,
        purpose: Purpose,
        client_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<VerifyOutcome, StoreError> {
        let digest = secret::digest(presented.trim());
        let outcome = match self.store.consume_if_valid(&digest, purpose, now).await? {
            Some(subject_id) => VerifyOutcome::Valid { subject_id },
            None => VerifyOutcome::InvalidOrExpired,
        };

        let (subject_id, label) = match outcome {
            VerifyOutcome::Valid { subject_id } => (Some(subject_id), "valid"),
            VerifyOutcome::InvalidOrExpired => (None, "invalid_or_expired"),
        };
        if let Err(err) = self
            .store
            .record_attempt(subject_id, purpose, label, client_ip)
            .await
        {
            // The attempt already settled; a lost audit row must not
            // change its outcome.
            error!("failed to record verification attempt: {err}");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::ChallengeVerifier;
    use crate::challenge::models::VerifyOutcome;
    use crate::challenge::purpose::Purpose;
    use crate::challenge::secret;
    use crate::challenge::store::{ChallengeStore, MemoryChallengeStore};
    use anyhow::Result;
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    async fn seeded(
        purpose: Purpose,
        plaintext: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<(MemoryChallengeStore, Uuid)> {
        let store = MemoryChallengeStore::new();
        let subject = Uuid::new_v4();
        store
            .create(subject, purpose, &secret::digest(plaintext), issued_at)
            .await?;
        Ok((store, subject))
    }

    #[tokio::test]
    async fn otp_valid_just_before_expiry_then_replay_rejected() -> Result<()> {
        let issued = Utc::now();
        let (store, subject) = seeded(Purpose::OtpVerification, "311042", issued).await?;
        let verifier = ChallengeVerifier::new(store);

        // 4:59 into a 5 minute window.
        let almost_expired = issued + Duration::seconds(299);
        let first = verifier
            .verify("311042", Purpose::OtpVerification, None, almost_expired)
            .await?;
        assert_eq!(first, VerifyOutcome::Valid {
            subject_id: subject
        });

        let replay = verifier
            .verify(
                "311042",
                Purpose::OtpVerification,
                None,
                almost_expired + Duration::milliseconds(1),
            )
            .await?;
        assert_eq!(replay, VerifyOutcome::InvalidOrExpired);
        Ok(())
    }

    #[tokio::test]
    async fn reset_token_rejected_after_window() -> Result<()> {
        let issued = Utc::now();
        let (store, _) = seeded(Purpose::PasswordReset, "a1b2c3", issued).await?;
        let verifier = ChallengeVerifier::new(store);

        // 31:00 into a 30 minute window, never consumed before.
        let late = issued + Duration::minutes(31);
        let outcome = verifier
            .verify("a1b2c3", Purpose::PasswordReset, None, late)
            .await?;
        assert_eq!(outcome, VerifyOutcome::InvalidOrExpired);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_secret_rejected_identically() -> Result<()> {
        let issued = Utc::now();
        let (store, _) = seeded(Purpose::OtpVerification, "652201", issued).await?;
        let verifier = ChallengeVerifier::new(store);

        let outcome = verifier
            .verify("000000", Purpose::OtpVerification, None, issued)
            .await?;
        assert_eq!(outcome, VerifyOutcome::InvalidOrExpired);
        Ok(())
    }

    #[tokio::test]
    async fn superseded_secret_rejected_even_if_unexpired() -> Result<()> {
        let store = MemoryChallengeStore::new();
        let subject = Uuid::new_v4();
        let now = Utc::now();

        store
            .create(subject, Purpose::PasswordReset, &secret::digest("token-a"), now)
            .await?;
        store
            .create(subject, Purpose::PasswordReset, &secret::digest("token-b"), now)
            .await?;

        let verifier = ChallengeVerifier::new(store);
        let old = verifier
            .verify("token-a", Purpose::PasswordReset, None, now)
            .await?;
        assert_eq!(old, VerifyOutcome::InvalidOrExpired);

        let new = verifier
            .verify("token-b", Purpose::PasswordReset, None, now)
            .await?;
        assert_eq!(new, VerifyOutcome::Valid {
            subject_id: subject
        });
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_verifications_succeed_exactly_once() -> Result<()> {
        let issued = Utc::now();
        let (store, _) = seeded(Purpose::OtpVerification, "909177", issued).await?;
        let verifier = ChallengeVerifier::new(store);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let verifier = verifier.clone();
            handles.push(tokio::spawn(async move {
                verifier
                    .verify("909177", Purpose::OtpVerification, None, issued)
                    .await
            }));
        }

        let mut valid = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await?? {
                VerifyOutcome::Valid { .. } => valid += 1,
                VerifyOutcome::InvalidOrExpired => rejected += 1,
            }
        }
        assert_eq!(valid, 1);
        assert_eq!(rejected, 7);
        Ok(())
    }

    #[tokio::test]
    async fn attempts_are_audited() -> Result<()> {
        let issued = Utc::now();
        let (store, subject) = seeded(Purpose::OtpVerification, "414141", issued).await?;
        let verifier = ChallengeVerifier::new(store.clone());

        verifier
            .verify("414141", Purpose::OtpVerification, Some("1.2.3.4"), issued)
            .await?;
        verifier
            .verify("414141", Purpose::OtpVerification, Some("1.2.3.4"), issued)
            .await?;

        let attempts = store.attempts().await;
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].subject_id, Some(subject));
        assert_eq!(attempts[0].outcome, "valid");
        assert_eq!(attempts[1].subject_id, None);
        assert_eq!(attempts[1].outcome, "invalid_or_expired");
        assert_eq!(attempts[1].client_ip.as_deref(), Some("1.2.3.4"));
        Ok(())
    }
}
