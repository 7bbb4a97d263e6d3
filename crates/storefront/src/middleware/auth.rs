//! Bearer-token extractors.
//!
//! Handlers take [`RequireAuth`] to demand a signed-in customer or
//! [`OptionalAuth`] when a token only personalizes the response. Any state
//! that can hand out a [`TokenVerifier`] works, so the admin app reuses them.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, AuthUser, TokenVerifier};

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("orders of {}", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, &TokenVerifier::from_ref(state))?;
        Ok(Self(user))
    }
}

/// Extractor that reads a bearer token when present.
///
/// A missing token yields `None`; a present but invalid one is still
/// rejected so clients notice expired sessions.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    TokenVerifier: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match authenticate(parts, &TokenVerifier::from_ref(state)) {
            Ok(user) => Ok(Self(Some(user))),
            Err(AppError::Auth(AuthError::MissingToken)) => Ok(Self(None)),
            Err(e) => Err(e),
        }
    }
}

fn authenticate(parts: &Parts, verifier: &TokenVerifier) -> Result<AuthUser, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let user = verifier.verify_header(header).inspect_err(|e| {
        if !matches!(e, AuthError::MissingToken) {
            tracing::debug!(error = %e, "Rejected bearer token");
        }
    })?;

    tracing::Span::current().record("user_id", tracing::field::display(&user.id));
    set_sentry_user(&user.id, user.email.as_deref());
    Ok(user)
}
