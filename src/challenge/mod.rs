//! Ephemeral credential challenges: issue, deliver, verify once, expire.
//!
//! A challenge proves control of an identifier before a sensitive account
//! change. The subsystem issues a single-use secret (reset token or numeric
//! code), hands the plaintext to the notifier, stores only a digest, and
//! later consumes the challenge atomically when the secret comes back.
//! Issuance responses are indistinguishable whether or not the identifier
//! resolved, and verification failures are deliberately undifferentiated.

pub mod error;
pub mod issuer;
pub mod models;
pub mod purpose;
pub mod rate_limit;
pub mod secret;
pub mod store;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DeliveryError, DirectoryError, StoreError};
pub use issuer::{ChallengeIssuer, IssueOutcome};
pub use models::{Challenge, VerifyOutcome};
pub use purpose::Purpose;
pub use rate_limit::{NoopRateLimiter, RateLimitAction, RateLimitDecision, RateLimiter};
pub use store::{ChallengeStore, MemoryChallengeStore, PgChallengeStore};
pub use verifier::ChallengeVerifier;
