//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::storage::S3Client;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pub config: Config,
    pub s3_client: S3Client,
    pub db: SqlitePool,
    pub tokens: TokenIssuer,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config, s3_client: S3Client, db: SqlitePool) -> Self {
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                s3_client,
                db,
                tokens,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the S3 client
    pub fn s3_client(&self) -> &S3Client {
        &self.inner.s3_client
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the session token issuer
    pub fn tokens(&self) -> &TokenIssuer {
        &self.inner.tokens
    }
}
