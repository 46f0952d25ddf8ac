//! Request/response types for the challenge endpoints.
//!
//! Responses carry a single `status` field by design; nothing about the
//! internal outcome leaks through the shape.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::challenge::Purpose;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RequestChallengeRequest {
    pub identifier: String,
    pub purpose: Purpose,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubmitChallengeRequest {
    pub purpose: Purpose,
    pub secret: String,
    /// Purpose effect payload: the new password hash for a reset, absent
    /// for an OTP unlock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChallengeStatusResponse {
    pub status: String,
}

impl ChallengeStatusResponse {
    #[must_use]
    pub fn accepted() -> Self {
        Self {
            status: "accepted".to_string(),
        }
    }

    #[must_use]
    pub fn verified() -> Self {
        Self {
            status: "verified".to_string(),
        }
    }

    #[must_use]
    pub fn rejected() -> Self {
        Self {
            status: "rejected".to_string(),
        }
    }
}
