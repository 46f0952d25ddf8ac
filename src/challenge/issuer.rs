//! Challenge issuance.
//!
//! The outward result of a request is always "accepted"; the outcome enum
//! below exists for logging and tests only. Unknown identifier, cooldown,
//! storage trouble, delivery trouble: the caller answers the client
//! identically in every case.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

use super::purpose::Purpose;
use super::secret;
use super::store::ChallengeStore;
use crate::directory::UserDirectory;
use crate::notify::{Notice, Notifier};

/// What actually happened during issuance. Collapsed to "accepted" at the
/// HTTP boundary.
#[derive(Debug)]
pub enum IssueOutcome {
    Issued,
    Cooldown,
    UnknownIdentifier,
    DeliveryFailed,
}

#[derive(Clone)]
pub struct ChallengeIssuer<S> {
    store: S,
    directory: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    base_url: String,
}

impl<S: ChallengeStore> ChallengeIssuer<S> {
    #[must_use]
    pub fn new(
        store: S,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        base_url: String,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            base_url,
        }
    }

    /// Issue a challenge for `identifier`, or pretend to.
    pub async fn request(
        &self,
        identifier: &str,
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<IssueOutcome> {
        let account = self
            .directory
            .find_by_identifier(identifier)
            .await
            .context("identifier lookup failed")?;

        let Some(account) = account else {
            // Unknown identifiers burn the same generation and rendering
            // work as the real path so response timing does not betray
            // account existence.
            let decoy = secret::generate(purpose)?;
            let _ = secret::digest_secret(&decoy);
            let _ = Notice::compose(purpose, &decoy, &self.base_url);
            return Ok(IssueOutcome::UnknownIdentifier);
        };

        let cooldown_start = now - purpose.resend_cooldown();
        if self
            .store
            .issued_since(account.subject_id, purpose, cooldown_start)
            .await?
        {
            return Ok(IssueOutcome::Cooldown);
        }

        let plaintext = secret::generate(purpose)?;
        let digest = secret::digest_secret(&plaintext);
        let challenge_id = self
            .store
            .create(account.subject_id, purpose, &digest, now)
            .await?;

        let notice = Notice::compose(purpose, &plaintext, &self.base_url);
        if let Err(err) = self.notifier.send(&account.destination, &notice) {
            // A secret that was never sent must not stay live.
            warn!(
                subject_id = %account.subject_id,
                purpose = purpose.as_str(),
                "delivery failed, invalidating challenge: {err}"
            );
            self.store.invalidate(challenge_id).await?;
            return Ok(IssueOutcome::DeliveryFailed);
        }

        Ok(IssueOutcome::Issued)
    }
}
