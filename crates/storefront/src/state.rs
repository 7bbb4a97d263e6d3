//! Application state shared across handlers.

use std::sync::Arc;

use axum::extract::FromRef;
use chrono::FixedOffset;
use sqlx::PgPool;
use url::Url;

use crate::config::{ConfigError, StorefrontConfig};
use crate::services::auth::TokenVerifier;
use crate::services::functions::{FunctionsClient, FunctionsError};
use crate::services::viacep::{CepLookupError, ViaCepClient};

/// Error assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid base_url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("base_url must have a host")]
    MissingHost,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("functions client: {0}")]
    Functions(#[from] FunctionsError),
    #[error("ViaCEP client: {0}")]
    ViaCep(#[from] CepLookupError),
}

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    verifier: TokenVerifier,
    functions: FunctionsClient,
    viacep: ViaCepClient,
    shop_offset: FixedOffset,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or UTC offset is invalid, or an HTTP
    /// client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let url = Url::parse(&config.base_url)?;
        if url.host_str().is_none() {
            return Err(StateError::MissingHost);
        }

        let shop_offset = config.shop_offset()?;
        let verifier = TokenVerifier::new(&config.auth);
        let functions = FunctionsClient::new(&config.functions)?;
        let viacep = ViaCepClient::new(&config.viacep_base_url)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                verifier,
                functions,
                viacep,
                shop_offset,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn verifier(&self) -> &TokenVerifier {
        &self.inner.verifier
    }

    /// Serverless functions client (payments, e-mail, calendar).
    #[must_use]
    pub fn functions(&self) -> &FunctionsClient {
        &self.inner.functions
    }

    #[must_use]
    pub fn viacep(&self) -> &ViaCepClient {
        &self.inner.viacep
    }

    /// The shop's fixed UTC offset for slot times.
    #[must_use]
    pub fn shop_offset(&self) -> FixedOffset {
        self.inner.shop_offset
    }

    /// The shop's current local date.
    #[must_use]
    pub fn today(&self) -> chrono::NaiveDate {
        chrono::Utc::now().with_timezone(&self.inner.shop_offset).date_naive()
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(state: &AppState) -> Self {
        state.inner.verifier.clone()
    }
}
