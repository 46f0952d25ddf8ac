//! Postgres-backed challenge store.
//!
//! `consume_if_valid` is a single conditional `UPDATE ... RETURNING`; the
//! database serializes concurrent consumers, so at most one caller observes
//! a live row. `create` supersedes prior live rows and inserts inside one
//! transaction; the partial unique index on live `(subject_id, purpose)`
//! rows backs it up against racing issuances.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::ChallengeStore;
use crate::challenge::error::StoreError;
use crate::challenge::purpose::Purpose;

#[derive(Clone)]
pub struct PgChallengeStore {
    pool: PgPool,
}

impl PgChallengeStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChallengeStore for PgChallengeStore {
    async fn create(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        digest: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let mut tx = self.pool.begin().await?;

        let query = r"
            UPDATE challenges
            SET superseded_at = $3
            WHERE subject_id = $1
              AND purpose = $2
              AND consumed_at IS NULL
              AND superseded_at IS NULL
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(subject_id)
            .bind(purpose.as_str())
            .bind(now)
            .execute(&mut *tx)
            .instrument(span)
            .await?;

        let query = r"
            INSERT INTO challenges
                (subject_id, purpose, secret_digest, issued_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(subject_id)
            .bind(purpose.as_str())
            .bind(digest)
            .bind(now)
            .bind(now + purpose.ttl())
            .fetch_one(&mut *tx)
            .instrument(span)
            .await?;

        tx.commit().await?;

        Ok(row.get("id"))
    }

    async fn consume_if_valid(
        &self,
        digest: &[u8],
        purpose: Purpose,
        now: DateTime<Utc>,
    ) -> Result<Option<Uuid>, StoreError> {
        let query = r"
            UPDATE challenges
            SET consumed_at = $3
            WHERE secret_digest = $1
              AND purpose = $2
              AND consumed_at IS NULL
              AND superseded_at IS NULL
              AND expires_at > $3
            RETURNING subject_id
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(digest)
            .bind(purpose.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.map(|row| row.get("subject_id")))
    }

    async fn invalidate(&self, challenge_id: Uuid) -> Result<(), StoreError> {
        let query = r"
            UPDATE challenges
            SET superseded_at = NOW()
            WHERE id = $1
              AND consumed_at IS NULL
              AND superseded_at IS NULL
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(challenge_id)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }

    async fn issued_since(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        since: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let query = r"
            SELECT 1 AS present
            FROM challenges
            WHERE subject_id = $1
              AND purpose = $2
              AND issued_at > $3
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(subject_id)
            .bind(purpose.as_str())
            .bind(since)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;
        Ok(row.is_some())
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let query = "DELETE FROM challenges WHERE expires_at < $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(now)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(result.rows_affected())
    }

    async fn record_attempt(
        &self,
        subject_id: Option<Uuid>,
        purpose: Purpose,
        outcome: &str,
        client_ip: Option<&str>,
    ) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO challenge_audit_log (subject_id, purpose, outcome, client_ip)
            VALUES ($1, $2, $3, $4)
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(subject_id)
            .bind(purpose.as_str())
            .bind(outcome)
            .bind(client_ip)
            .execute(&self.pool)
            .instrument(span)
            .await?;
        Ok(())
    }
}
