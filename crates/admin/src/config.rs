//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `AUTH_JWT_SECRET` - HS256 secret shared with the auth provider
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `AUTH_JWT_AUDIENCE` - Expected token audience (default: authenticated)
//! - `SHOP_UTC_OFFSET_HOURS` - Shop time zone as a whole-hour UTC offset (default: -3)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use chrono::FixedOffset;
use secrecy::SecretString;

use petshop_core::schedule;
use petshop_storefront::config::{
    AuthConfig, ConfigError, get_database_url, get_optional_env, get_utc_offset_hours, parse_env,
};

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Same token settings as the storefront; roles come from the database
    pub auth: AuthConfig,
    pub utc_offset_hours: i32,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: get_database_url("ADMIN_DATABASE_URL")?,
            host: parse_env("ADMIN_HOST", "127.0.0.1")?,
            port: parse_env("ADMIN_PORT", "3001")?,
            auth: AuthConfig::from_env()?,
            utc_offset_hours: get_utc_offset_hours()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// The shop's fixed UTC offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured hours are out of range.
    pub fn shop_offset(&self) -> Result<FixedOffset, ConfigError> {
        schedule::shop_offset(self.utc_offset_hours).map_err(|e| {
            ConfigError::InvalidEnvVar("SHOP_UTC_OFFSET_HOURS".to_string(), e.to_string())
        })
    }
}
