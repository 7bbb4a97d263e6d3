//! Application state shared across admin handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::{FixedOffset, NaiveDate};
use sqlx::PgPool;

use petshop_storefront::config::ConfigError;
use petshop_storefront::services::auth::TokenVerifier;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    verifier: TokenVerifier,
    shop_offset: FixedOffset,
}

impl AppState {
    /// # Errors
    ///
    /// Returns an error if the configured UTC offset is out of range.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, ConfigError> {
        let shop_offset = config.shop_offset()?;
        let verifier = TokenVerifier::new(&config.auth);
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                verifier,
                shop_offset,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn shop_offset(&self) -> FixedOffset {
        self.inner.shop_offset
    }

    /// Current date in the shop's time zone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        chrono::Utc::now().with_timezone(&self.inner.shop_offset).date_naive()
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.inner.verifier.clone()
    }
}
