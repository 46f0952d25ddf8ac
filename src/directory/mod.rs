//! The user-directory collaborator.
//!
//! The challenge subsystem never mutates accounts itself; it resolves
//! identifiers and applies purpose effects through this seam. Production
//! wires the Postgres implementation; tests substitute an in-memory fake.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::challenge::error::DirectoryError;
use crate::challenge::purpose::Purpose;

/// What the challenge subsystem needs to know about an account: a stable
/// subject id for storage and a delivery destination. Never more.
#[derive(Clone, Debug)]
pub struct AccountRecord {
    pub subject_id: Uuid,
    pub destination: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Resolve an identifier (normalized email) to an account, if any.
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountRecord>, DirectoryError>;

    /// Apply the purpose-specific effect for a verified subject: store the
    /// new password hash, or unlock the investing features.
    async fn apply_effect(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        payload: Option<&str>,
    ) -> Result<(), DirectoryError>;
}

#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<AccountRecord>, DirectoryError> {
        let query = "SELECT id, email FROM accounts WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.map(|row| AccountRecord {
            subject_id: row.get("id"),
            destination: row.get("email"),
        }))
    }

    async fn apply_effect(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
        payload: Option<&str>,
    ) -> Result<(), DirectoryError> {
        let result = match purpose {
            Purpose::PasswordReset => {
                let Some(password_hash) = payload else {
                    return Err(DirectoryError::Effect(
                        "password reset requires a payload".to_string(),
                    ));
                };
                let query = r"
                    UPDATE accounts
                    SET password_hash = $2,
                        updated_at = NOW()
                    WHERE id = $1
                ";
                let span = tracing::info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "UPDATE",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(subject_id)
                    .bind(password_hash)
                    .execute(&self.pool)
                    .instrument(span)
                    .await
                    .map_err(|err| DirectoryError::Effect(err.to_string()))?
            }
            Purpose::OtpVerification => {
                let query = r"
                    UPDATE accounts
                    SET investing_enabled = TRUE,
                        updated_at = NOW()
                    WHERE id = $1
                ";
                let span = tracing::info_span!(
                    "db.query",
                    db.system = "postgresql",
                    db.operation = "UPDATE",
                    db.statement = query
                );
                sqlx::query(query)
                    .bind(subject_id)
                    .execute(&self.pool)
                    .instrument(span)
                    .await
                    .map_err(|err| DirectoryError::Effect(err.to_string()))?
            }
        };

        if result.rows_affected() == 0 {
            return Err(DirectoryError::Effect(
                "subject no longer exists".to_string(),
            ));
        }

        Ok(())
    }
}
