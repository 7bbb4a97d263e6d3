//! Role-checked extractors for back-office handlers.
//!
//! [`RequireAdmin`] lets any back-office role through (read endpoints);
//! [`RequireWriter`] only lets `admin` through (anything that changes data).

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};

use petshop_core::AdminRole;
use petshop_storefront::db::AdminRoleRepository;
use petshop_storefront::error::AppError;
use petshop_storefront::middleware::RequireAuth;
use petshop_storefront::services::auth::AuthUser;

use crate::state::AppState;

/// A signed-in caller with a back-office role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub user: AuthUser,
    pub role: AdminRole,
}

/// Extractor for read access.
///
/// # Example
///
/// ```rust,ignore
/// async fn list(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("{} reading as {}", admin.user.id, admin.role)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        admin_user(parts, state, false).await.map(Self)
    }
}

/// Extractor for write access.
#[derive(Debug, Clone)]
pub struct RequireWriter(pub AdminUser);

impl FromRequestParts<AppState> for RequireWriter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        admin_user(parts, state, true).await.map(Self)
    }
}

async fn admin_user(parts: &mut Parts, state: &AppState, write: bool) -> Result<AdminUser, AppError> {
    let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
    let role = AdminRoleRepository::new(state.pool()).role_of(user.id).await?;
    let role = authorize(role, write).inspect_err(|_| {
        tracing::warn!(user_id = %user.id, write, "Back-office access denied");
    })?;
    Ok(AdminUser { user, role })
}

/// Decide whether a caller holding `role` may proceed.
fn authorize(role: Option<AdminRole>, write: bool) -> Result<AdminRole, AppError> {
    match role {
        None => Err(AppError::Forbidden("Back-office access required".to_owned())),
        Some(role) if write && !role.can_write() => {
            Err(AppError::Forbidden("Read-only access".to_owned()))
        }
        Some(role) => Ok(role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_role_forbidden() {
        assert!(matches!(authorize(None, false), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_viewer_reads_only() {
        assert!(matches!(
            authorize(Some(AdminRole::Viewer), false),
            Ok(AdminRole::Viewer)
        ));
        assert!(matches!(
            authorize(Some(AdminRole::Viewer), true),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_writes() {
        assert!(matches!(authorize(Some(AdminRole::Admin), true), Ok(AdminRole::Admin)));
    }
}
