//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL of the storefront, used for payment return URLs
//! - `AUTH_JWT_SECRET` - HS256 secret shared with the auth provider (min 32 chars, high entropy)
//! - `FUNCTIONS_URL` - Base URL of the serverless functions (checkout, e-mail, calendar)
//! - `FUNCTIONS_API_KEY` - Bearer key for the serverless functions
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `VIACEP_BASE_URL` - Postal-code lookup service (default: <https://viacep.com.br>)
//! - `SHOP_WHATSAPP_NUMBER` - Shop's `WhatsApp` number for contact links
//! - `SHOP_UTC_OFFSET_HOURS` - Shop time zone as a whole-hour UTC offset (default: -3)
//! - `STOREFRONT_RATE_LIMIT` - Per-IP rate limiting behind a proxy (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sentry sampling (default: 1.0 / 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use chrono::FixedOffset;
use petshop_core::schedule::{self, DEFAULT_UTC_OFFSET_HOURS};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_VIACEP_BASE_URL: &str = "https://viacep.com.br";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Token verification settings
    pub auth: AuthConfig,
    /// Serverless functions endpoint
    pub functions: FunctionsConfig,
    /// Base URL of the ViaCEP service
    pub viacep_base_url: String,
    /// Shop `WhatsApp` number, digits or formatted
    pub whatsapp_number: Option<String>,
    /// Shop time zone, whole hours from UTC
    pub utc_offset_hours: i32,
    /// Per-IP rate limiting; needs a proxy that sets client IP headers
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Settings for verifying the auth provider's access tokens.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: SecretString,
    /// Expected `aud` claim
    pub audience: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("audience", &self.audience)
            .finish()
    }
}

/// Serverless functions configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct FunctionsConfig {
    /// Base URL; functions are called at `{url}/{name}`
    pub url: String,
    /// Bearer key sent with every call
    pub api_key: SecretString,
}

impl std::fmt::Debug for FunctionsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionsConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let auth = AuthConfig::from_env()?;
        let functions = FunctionsConfig::from_env()?;

        let utc_offset_hours = get_utc_offset_hours()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            auth,
            functions,
            viacep_base_url: get_env_or_default("VIACEP_BASE_URL", DEFAULT_VIACEP_BASE_URL),
            whatsapp_number: get_optional_env("SHOP_WHATSAPP_NUMBER"),
            utc_offset_hours,
            rate_limit: parse_env("STOREFRONT_RATE_LIMIT", "true")?,
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

impl AuthConfig {
    /// Load `AUTH_JWT_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is missing, short or looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = get_validated_secret("AUTH_JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "AUTH_JWT_SECRET")?;
        Ok(Self {
            jwt_secret,
            audience: get_env_or_default("AUTH_JWT_AUDIENCE", "authenticated"),
        })
    }
}

impl FunctionsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: get_required_env("FUNCTIONS_URL")?
                .trim_end_matches('/')
                .to_string(),
            api_key: get_validated_secret("FUNCTIONS_API_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` when unset.
pub fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` naming `primary_key` when neither is set.
pub fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
#[must_use]
pub fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when unset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` when the value does not parse.
pub fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Read `SHOP_UTC_OFFSET_HOURS` and check it is a valid offset.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for non-numeric or out-of-range values.
pub fn get_utc_offset_hours() -> Result<i32, ConfigError> {
    let hours: i32 = parse_env(
        "SHOP_UTC_OFFSET_HOURS",
        &DEFAULT_UTC_OFFSET_HOURS.to_string(),
    )?;
    schedule::shop_offset(hours).map_err(|e| {
        ConfigError::InvalidEnvVar("SHOP_UTC_OFFSET_HOURS".to_string(), e.to_string())
    })?;
    Ok(hours)
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
///
/// # Errors
///
/// Returns an error if the variable is missing or fails the strength checks.
pub fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/petshop".to_owned()),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            auth: AuthConfig {
                jwt_secret: SecretString::from("jwt-signing-value-that-should-not-leak".to_owned()),
                audience: "authenticated".to_string(),
            },
            functions: FunctionsConfig {
                url: "https://functions.local".to_string(),
                api_key: SecretString::from("functions-key-that-should-not-leak".to_owned()),
            },
            viacep_base_url: DEFAULT_VIACEP_BASE_URL.to_string(),
            whatsapp_number: None,
            utc_offset_hours: -3,
            rate_limit: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-secret-here", "AUTH_JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "AUTH_JWT_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "AUTH_JWT_SECRET");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short".to_owned()), "AUTH_JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("a".repeat(32)), "AUTH_JWT_SECRET").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_shop_offset() {
        let mut config = config();
        assert_eq!(config.shop_offset().unwrap().local_minus_utc(), -3 * 3600);
        config.utc_offset_hours = 40;
        assert!(config.shop_offset().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", config());
        assert!(debug_output.contains("https://functions.local"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("jwt-signing-value-that-should-not-leak"));
        assert!(!debug_output.contains("functions-key-that-should-not-leak"));
    }
}
