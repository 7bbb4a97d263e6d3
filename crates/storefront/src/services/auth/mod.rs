//! Bearer-token authentication.
//!
//! Users sign in with the hosted auth provider, which issues HS256 JWTs.
//! The API only verifies them: signature, expiry, audience, and a `sub`
//! claim holding the user's UUID.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::ExposeSecret;
use serde::Deserialize;

use petshop_core::UserId;

use crate::config::AuthConfig;

/// Claims the API reads from a token.
#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: UserId,
    pub email: Option<String>,
}

/// Verifies bearer tokens issued by the auth provider.
#[derive(Clone)]
pub struct TokenVerifier {
    inner: Arc<VerifierInner>,
}

struct VerifierInner {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);
        Self {
            inner: Arc::new(VerifierInner {
                key: DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
                validation,
            }),
        }
    }

    /// Verify a raw token and return the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for a bad signature, expired token or
    /// wrong audience, and `AuthError::InvalidSubject` if `sub` is not a UUID.
    pub fn verify(&self, token: &str) -> Result<AuthUser, AuthError> {
        let data = decode::<Claims>(token, &self.inner.key, &self.inner.validation)?;
        let id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidSubject)?;
        Ok(AuthUser {
            id,
            email: data.claims.email.filter(|e| !e.is_empty()),
        })
    }

    /// Extract and verify the token from an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingToken` when the header is absent or not a
    /// bearer credential, otherwise as [`TokenVerifier::verify`].
    pub fn verify_header(&self, header: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = header
            .and_then(|value| {
                value
                    .strip_prefix("Bearer ")
                    .or_else(|| value.strip_prefix("bearer "))
            })
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.verify(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use secrecy::SecretString;
    use serde_json::json;

    const SECRET: &str = "kT9#mQ2$vL7@wR4&nB8*pY3!hF6^jD1%";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&AuthConfig {
            jwt_secret: SecretString::from(SECRET.to_owned()),
            audience: "authenticated".to_owned(),
        })
    }

    fn token(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token() {
        let sub = "6f1c2a0e-3b7d-4c55-9e1a-0d2f4b6c8a10";
        let raw = token(
            &json!({"sub": sub, "email": "ana@example.com", "aud": "authenticated", "exp": future_exp()}),
            SECRET,
        );
        let user = verifier().verify_header(Some(&format!("Bearer {raw}"))).unwrap();
        assert_eq!(user.id.to_string(), sub);
        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let raw = token(
            &json!({"sub": "6f1c2a0e-3b7d-4c55-9e1a-0d2f4b6c8a10", "aud": "authenticated", "exp": future_exp()}),
            "another-secret-entirely-0123456789",
        );
        assert!(matches!(verifier().verify(&raw), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let raw = token(
            &json!({"sub": "6f1c2a0e-3b7d-4c55-9e1a-0d2f4b6c8a10", "aud": "anon", "exp": future_exp()}),
            SECRET,
        );
        assert!(verifier().verify(&raw).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let raw = token(
            &json!({"sub": "6f1c2a0e-3b7d-4c55-9e1a-0d2f4b6c8a10", "aud": "authenticated", "exp": 1_000_000}),
            SECRET,
        );
        assert!(verifier().verify(&raw).is_err());
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let raw = token(
            &json!({"sub": "user-42", "aud": "authenticated", "exp": future_exp()}),
            SECRET,
        );
        assert!(matches!(verifier().verify(&raw), Err(AuthError::InvalidSubject)));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(verifier().verify_header(None), Err(AuthError::MissingToken)));
        assert!(matches!(
            verifier().verify_header(Some("Basic abc")),
            Err(AuthError::MissingToken)
        ));
    }
}
