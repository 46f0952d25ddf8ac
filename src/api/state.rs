//! Service configuration and shared handler state.

use std::sync::Arc;

use crate::challenge::{
    ChallengeIssuer, ChallengeVerifier, PgChallengeStore, RateLimiter,
};
use crate::directory::UserDirectory;
use crate::notify::Notifier;

const DEFAULT_PURGE_INTERVAL_SECONDS: u64 = 5 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    base_url: String,
    purge_interval_seconds: u64,
}

impl AppConfig {
    /// `base_url` is the public web origin: reset links point at it and CORS
    /// is pinned to it.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            purge_interval_seconds: DEFAULT_PURGE_INTERVAL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_purge_interval_seconds(mut self, seconds: u64) -> Self {
        self.purge_interval_seconds = seconds;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn purge_interval_seconds(&self) -> u64 {
        self.purge_interval_seconds
    }
}

/// Everything the challenge handlers share. Collaborators are explicit
/// handles; nothing here is process-global.
pub struct AppState {
    config: AppConfig,
    issuer: ChallengeIssuer<PgChallengeStore>,
    verifier: ChallengeVerifier<PgChallengeStore>,
    directory: Arc<dyn UserDirectory>,
    limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: PgChallengeStore,
        directory: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let issuer = ChallengeIssuer::new(
            store.clone(),
            directory.clone(),
            notifier,
            config.base_url().to_string(),
        );
        let verifier = ChallengeVerifier::new(store);
        Self {
            config,
            issuer,
            verifier,
            directory,
            limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn issuer(&self) -> &ChallengeIssuer<PgChallengeStore> {
        &self.issuer
    }

    pub(crate) fn verifier(&self) -> &ChallengeVerifier<PgChallengeStore> {
        &self.verifier
    }

    pub(crate) fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    pub(crate) fn limiter(&self) -> &dyn RateLimiter {
        self.limiter.as_ref()
    }
}
