use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::challenge::{store, NoopRateLimiter, PgChallengeStore, RateLimiter};
use crate::directory::PgUserDirectory;
use crate::notify::{LogNotifier, Notifier};

pub(crate) mod handlers;
mod openapi;
mod state;

pub use openapi::ApiDoc;
pub use state::{AppConfig, AppState};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: AppConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let challenge_store = PgChallengeStore::new(pool.clone());
    let directory = Arc::new(PgUserDirectory::new(pool));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let limiter: Arc<dyn RateLimiter> = Arc::new(NoopRateLimiter);
    let app_state = Arc::new(AppState::new(
        config.clone(),
        challenge_store.clone(),
        directory,
        notifier,
        limiter,
    ));

    // Expired rows are garbage, not state; collect them in the background.
    store::spawn_purge_worker(
        challenge_store,
        Duration::from_secs(config.purge_interval_seconds()),
    );

    let web_origin = web_origin(config.base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(web_origin))
        .allow_credentials(true);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health))
        .route(
            "/v1/challenges/request",
            post(handlers::challenge::request_challenge),
        )
        .route(
            "/v1/challenges/submit",
            post(handlers::challenge::submit_challenge),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(app_state)),
        );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn web_origin(base_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Base URL must include a valid host: {base_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build web origin header")
}

#[cfg(test)]
mod tests {
    use super::web_origin;

    #[test]
    fn web_origin_strips_path_and_keeps_port() {
        let origin = web_origin("https://bank.example:8443/app/").expect("origin");
        assert_eq!(origin, "https://bank.example:8443");

        let origin = web_origin("https://bank.example/app").expect("origin");
        assert_eq!(origin, "https://bank.example");
    }

    #[test]
    fn web_origin_rejects_garbage() {
        assert!(web_origin("not a url").is_err());
    }
}
