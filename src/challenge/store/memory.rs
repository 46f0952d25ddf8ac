//! In-memory challenge store.
//!
//! Serves single-node deployments and tests. All checks and writes for one
//! operation happen under a single mutex guard, which gives
//! `consume_if_valid` the same indivisibility the Postgres store gets from
//! its conditional UPDATE.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::ChallengeStore;
use crate::challenge::error::StoreError;
use crate::challenge::models::Challenge;
use crate::challenge::purpose::Purpose;

/// One audited verification attempt, as the memory store keeps it.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub subject_id: Option<Uuid>,
    pub purpose: Purpose,
    pub outcome: String,
    pub client_ip: Option<String>,
}

#[derive(Default)]
struct Inner {
    challenges: HashMap<Uuid, Challenge>,
    attempts: Vec<AttemptRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryChallengeStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryChallengeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a challenge by id.
    pub async fn get(&self, challenge_id: Uuid) -> Option<Challenge> {
        let inner = self.inner.lock().await;
        inner.challenges.get(&challenge_id).cloned()
    }

    /// Number of stored rows, live or not.
    pub async fn len(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.challenges.len()
    }

    /// Number of rows `consume_if_valid` would still accept at `now`.
    pub async fn live_count(&self, now: DateTime<Utc>) -> usize {
        let inner = self.inner.lock().await;
        inner
            .challenges
            .values()
            .filter(|challenge| challenge.is_live(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Recorded verification attempts, oldest first.
    pub async fn attempts(&self) -> Vec<AttemptRecord> {
        let inner = self.inner.lock().await;
        inner.attempts.clone()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn create(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        digest: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let mut inner = self.inner.lock().await;

        for challenge in inner.challenges.values_mut() {
            if challenge.subject_id == subject_id
                && challenge.purpose == purpose
                && challenge.consumed_at.is_none()
                && challenge.superseded_at.is_none()
            {
                challenge.superseded_at = Some(now);
            }
        }

        let id = Uuid::new_v4();
        inner.challenges.insert(
            id,
            Challenge {
                id,
                subject_id,
                purpose,
                secret_digest: digest.to_vec(),
                issued_at: now,
                expires_at: now + purpose.ttl(),
                consumed_at: None,
                superseded_at: None,
            },
        );

        Ok(id)
    }

    async fn consume_if_valid(
        &self,
        digest: &[u8],
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let mut inner = self.inner.lock().await;

        let candidate = inner.challenges.values_mut().find(|challenge| {
            challenge.purpose == purpose
                && challenge.secret_digest == digest
                && challenge.is_live(now)
        });

        match candidate {
            Some(challenge) => {
                challenge.consumed_at = Some(now);
                Ok(Some(challenge.subject_id))
            }
            None => Ok(None),
        }
    }

    async fn invalidate(&self, challenge_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(challenge) = inner.challenges.get_mut(&challenge_id) {
            if challenge.consumed_at.is_none() && challenge.superseded_at.is_none() {
                challenge.superseded_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn issued_since(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.challenges.values().any(|challenge| {
            challenge.subject_id == subject_id
                && challenge.purpose == purpose
                && challenge.issued_at > since
        }))
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.challenges.len();
        inner
            .challenges
            .retain(|_, challenge| challenge.expires_at >= now);
        Ok((before - inner.challenges.len()) as u64)
    }

    async fn record_attempt(
        &self,
        subject_id: Option<Uuid>,
        purpose: Purpose,
        outcome: &str,
        client_ip: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.attempts.push(AttemptRecord {
            subject_id,
            purpose,
            outcome: outcome.to_string(),
            client_ip: client_ip.map(str::to_string),
        });
        Ok(())
    }
}
