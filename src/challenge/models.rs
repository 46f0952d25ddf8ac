//! The persisted challenge record and verification outcomes.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::purpose::Purpose;

/// One issued challenge. The plaintext secret is never part of this record;
/// only its digest is.
#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub purpose: Purpose,
    pub secret_digest: Vec<u8>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub superseded_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// A live challenge is the only kind `consume_if_valid` will accept:
    /// unconsumed, unsuperseded, and not yet past its expiry.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && self.superseded_at.is_none() && now < self.expires_at
    }
}

/// Result of a verification attempt. Expired, consumed, superseded, and
/// unknown secrets are deliberately indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid { subject_id: Uuid },
    InvalidOrExpired,
}

impl VerifyOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}
