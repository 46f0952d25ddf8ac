//! Challenge issuance and submission endpoints.
//!
//! The issuance response is identical whether the identifier resolved,
//! whether the cooldown fired, and whether delivery worked; the submission
//! response never says why a secret was refused.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error};

use super::types::{
    ChallengeStatusResponse, RequestChallengeRequest, SubmitChallengeRequest,
};
use super::utils::{
    extract_client_ip, normalize_identifier, valid_identifier, valid_password_hash,
};
use crate::api::state::AppState;
use crate::challenge::{Purpose, RateLimitAction, RateLimitDecision, VerifyOutcome};

/// Ask for a challenge to be issued and delivered out-of-band.
#[utoipa::path(
    post,
    path = "/v1/challenges/request",
    request_body = RequestChallengeRequest,
    responses(
        (status = 202, description = "Request accepted", body = ChallengeStatusResponse),
        (status = 400, description = "Missing payload", body = String)
    ),
    tag = "challenges"
)]
pub async fn request_challenge(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RequestChallengeRequest>>,
) -> impl IntoResponse {
    let request: RequestChallengeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let identifier = normalize_identifier(&request.identifier);
    if !valid_identifier(&identifier) {
        // Malformed identifiers get the same accepted response as unknown
        // ones; a different answer would make probing cheap.
        return accepted();
    }

    let client_ip = extract_client_ip(&headers);
    if state
        .limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::RequestChallenge)
        == RateLimitDecision::Limited
    {
        return accepted();
    }
    if state
        .limiter()
        .check_identifier(&identifier, RateLimitAction::RequestChallenge)
        == RateLimitDecision::Limited
    {
        return accepted();
    }

    match state
        .issuer()
        .request(&identifier, request.purpose, Utc::now())
        .await
    {
        Ok(outcome) => debug!(outcome = ?outcome, "challenge request processed"),
        Err(err) => error!("challenge request failed: {err}"),
    }

    accepted()
}

/// Present a secret and, on success, apply the purpose effect.
#[utoipa::path(
    post,
    path = "/v1/challenges/submit",
    request_body = SubmitChallengeRequest,
    responses(
        (status = 200, description = "Challenge verified", body = ChallengeStatusResponse),
        (status = 400, description = "Missing or malformed payload", body = String),
        (status = 422, description = "Challenge rejected", body = ChallengeStatusResponse),
        (status = 429, description = "Rate limited", body = String)
    ),
    tag = "challenges"
)]
pub async fn submit_challenge(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SubmitChallengeRequest>>,
) -> impl IntoResponse {
    let request: SubmitChallengeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let secret = request.secret.trim();
    if secret.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing secret".to_string()).into_response();
    }

    // Validate the effect payload before any token work so a malformed
    // request cannot burn a live challenge.
    if request.purpose == Purpose::PasswordReset
        && !request.payload.as_deref().is_some_and(valid_password_hash)
    {
        return (StatusCode::BAD_REQUEST, "Invalid payload".to_string()).into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if state
        .limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::SubmitChallenge)
        == RateLimitDecision::Limited
    {
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limited".to_string()).into_response();
    }

    match state
        .verifier()
        .verify(secret, request.purpose, client_ip.as_deref(), Utc::now())
        .await
    {
        Ok(VerifyOutcome::Valid { subject_id }) => {
            match state
                .directory()
                .apply_effect(subject_id, request.purpose, request.payload.as_deref())
                .await
            {
                Ok(()) => {
                    (StatusCode::OK, Json(ChallengeStatusResponse::verified())).into_response()
                }
                Err(err) => {
                    error!("failed to apply challenge effect: {err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Verification failed".to_string(),
                    )
                        .into_response()
                }
            }
        }
        Ok(VerifyOutcome::InvalidOrExpired) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ChallengeStatusResponse::rejected()),
        )
            .into_response(),
        Err(err) => {
            error!("challenge verification failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Verification failed".to_string(),
            )
                .into_response()
        }
    }
}

fn accepted() -> Response {
    (
        StatusCode::ACCEPTED,
        Json(ChallengeStatusResponse::accepted()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::{request_challenge, submit_challenge};
    use crate::api::state::{AppConfig, AppState};
    use crate::challenge::{NoopRateLimiter, PgChallengeStore, Purpose, RateLimiter};
    use crate::directory::PgUserDirectory;
    use crate::notify::{LogNotifier, Notifier};
    use anyhow::Result;
    use axum::extract::Extension;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::Json;
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    fn app_state() -> Result<Arc<AppState>> {
        let pool = PgPoolOptions::new().connect_lazy("postgres://postgres@localhost/postgres")?;
        let config = AppConfig::new("https://bank.example".to_string());
        let store = PgChallengeStore::new(pool.clone());
        let directory = Arc::new(PgUserDirectory::new(pool));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
        let limiter: Arc<dyn RateLimiter> = Arc::new(NoopRateLimiter);
        Ok(Arc::new(AppState::new(
            config, store, directory, notifier, limiter,
        )))
    }

    #[tokio::test]
    async fn request_challenge_missing_payload() -> Result<()> {
        let response = request_challenge(HeaderMap::new(), Extension(app_state()?), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn request_challenge_malformed_identifier_is_accepted() -> Result<()> {
        let response = request_challenge(
            HeaderMap::new(),
            Extension(app_state()?),
            Some(Json(super::RequestChallengeRequest {
                identifier: "not-an-email".to_string(),
                purpose: Purpose::PasswordReset,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        Ok(())
    }

    #[tokio::test]
    async fn request_challenge_accepted_even_when_storage_is_unreachable() -> Result<()> {
        // The lazy pool has nothing to connect to, so the issuer fails
        // internally; the outward response must not change.
        let response = request_challenge(
            HeaderMap::new(),
            Extension(app_state()?),
            Some(Json(super::RequestChallengeRequest {
                identifier: "maria@example.com".to_string(),
                purpose: Purpose::OtpVerification,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        Ok(())
    }

    #[tokio::test]
    async fn submit_challenge_missing_payload() -> Result<()> {
        let response = submit_challenge(HeaderMap::new(), Extension(app_state()?), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn submit_challenge_empty_secret() -> Result<()> {
        let response = submit_challenge(
            HeaderMap::new(),
            Extension(app_state()?),
            Some(Json(super::SubmitChallengeRequest {
                purpose: Purpose::OtpVerification,
                secret: " ".to_string(),
                payload: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn submit_reset_without_password_hash_is_rejected_early() -> Result<()> {
        let response = submit_challenge(
            HeaderMap::new(),
            Extension(app_state()?),
            Some(Json(super::SubmitChallengeRequest {
                purpose: Purpose::PasswordReset,
                secret: "deadbeef".to_string(),
                payload: Some("not-a-hash".to_string()),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
