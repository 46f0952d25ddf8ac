//! OpenAPI document for the service.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::challenge::Purpose;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::challenge::request_challenge,
        handlers::challenge::submit_challenge,
    ),
    components(schemas(
        handlers::types::RequestChallengeRequest,
        handlers::types::SubmitChallengeRequest,
        handlers::types::ChallengeStatusResponse,
        Purpose,
    )),
    tags(
        (name = "challenges", description = "Credential challenge issuance and verification"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
