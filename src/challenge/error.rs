//! Error taxonomy for the challenge subsystem and its collaborators.
//!
//! None of these reach an external client verbatim: issuance collapses every
//! failure into an accepted response, verification into rejected. The types
//! exist so internal callers can log and react precisely.

use thiserror::Error;

/// Persistence failure in the challenge store. Transient from the caller's
/// point of view; retry at the caller's discretion.
#[derive(Debug, Error)]
#[error("challenge storage failure: {reason}")]
pub struct StoreError {
    reason: String,
}

impl StoreError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Transport failure while handing a secret to the notifier. Logged and
/// swallowed into the generic accepted response.
#[derive(Debug, Error)]
#[error("challenge delivery failure: {reason}")]
pub struct DeliveryError {
    reason: String,
}

impl DeliveryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// User-directory failure. Never reveals whether the subject existed.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory lookup failure: {0}")]
    Lookup(String),
    #[error("directory effect failure: {0}")]
    Effect(String),
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Lookup(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryError, DirectoryError, StoreError};

    #[test]
    fn store_error_displays_reason() {
        let err = StoreError::new("pool timed out");
        assert_eq!(err.to_string(), "challenge storage failure: pool timed out");
    }

    #[test]
    fn delivery_error_displays_reason() {
        let err = DeliveryError::new("smtp refused");
        assert_eq!(err.to_string(), "challenge delivery failure: smtp refused");
    }

    #[test]
    fn directory_error_distinguishes_phases() {
        assert_eq!(
            DirectoryError::Lookup("down".to_string()).to_string(),
            "directory lookup failure: down"
        );
        assert_eq!(
            DirectoryError::Effect("constraint".to_string()).to_string(),
            "directory effect failure: constraint"
        );
    }
}
