//! Challenge persistence.
//!
//! The store is the only shared mutable state in the subsystem, and
//! [`ChallengeStore::consume_if_valid`] is its correctness primitive: lookup,
//! expiry check, and consumption happen in one indivisible step so two
//! concurrent verifications of the same secret cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

use super::error::StoreError;
use super::purpose::Purpose;

mod memory;
mod postgres;

pub use memory::{AttemptRecord, MemoryChallengeStore};
pub use postgres::PgChallengeStore;

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Persist a new challenge and supersede any live one for the same
    /// `(subject, purpose)` pair, atomically. Returns the challenge id.
    async fn create(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        digest: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Uuid, StoreError>;

    /// Atomically consume the live, unexpired challenge matching
    /// `digest` + `purpose`. Returns the subject id on success, `None` when
    /// the secret is unknown, expired, superseded, or already consumed; no
    /// side effects in the `None` case.
    async fn consume_if_valid(
        &self,
        digest: &[u8],
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError>;

    /// Mark a specific challenge superseded. Used when delivery fails after
    /// persistence so a secret that was never sent does not stay live.
    async fn invalidate(&self, challenge_id: Uuid) -> Result<(), StoreError>;

    /// Whether any challenge for the pair was issued after `since`. Backs
    /// the server-side resend cooldown.
    async fn issued_since(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Delete rows whose expiry has passed. Advisory housekeeping; safe to
    /// run concurrently with issuance and verification.
    async fn purge(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Record one verification attempt in the audit trail.
    async fn record_attempt(
        &self,
        subject_id: Option<Uuid>,
        purpose: Purpose,
        outcome: &str,
        client_ip: Option<&str>,
    ) -> Result<(), StoreError>;
}

/// Background worker that garbage-collects expired challenges.
pub fn spawn_purge_worker<S>(store: S, interval: Duration) -> tokio::task::JoinHandle<()>
where
    S: ChallengeStore + 'static,
{
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            match store.purge(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "purged expired challenges"),
                Err(err) => error!("challenge purge failed: {err}"),
            }
        }
    })
}
