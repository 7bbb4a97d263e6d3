//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while authenticating a bearer token.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, expiry or audience check failed.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The `sub` claim is not a user UUID.
    #[error("invalid subject claim")]
    InvalidSubject,
}
