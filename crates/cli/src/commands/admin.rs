//! Back-office role management.
//!
//! Users live in the auth provider; a role row is all the back office needs.

use petshop_core::{AdminRole, UserId};
use petshop_storefront::db::{AdminRoleRepository, RepositoryError};
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid role: {0}. Valid roles: admin, viewer")]
    InvalidRole(String),

    #[error("Invalid user id: {0}")]
    InvalidUser(String),
}

fn parse_user(user: &str) -> Result<UserId, AdminError> {
    user.trim()
        .parse()
        .map_err(|_| AdminError::InvalidUser(user.to_owned()))
}

fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.trim()
        .to_lowercase()
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))
}

/// Grant `role` to `user`, replacing any previous role.
pub async fn grant(user: &str, role: &str) -> Result<(), AdminError> {
    let user_id = parse_user(user)?;
    let role = parse_role(role)?;

    let pool = connect().await?;
    AdminRoleRepository::new(&pool).grant(user_id, role).await?;

    tracing::info!(%user_id, %role, "Role granted");
    Ok(())
}

/// Remove `user`'s role. Not having one is not an error.
pub async fn revoke(user: &str) -> Result<(), AdminError> {
    let user_id = parse_user(user)?;

    let pool = connect().await?;
    if AdminRoleRepository::new(&pool).revoke(user_id).await? {
        tracing::info!(%user_id, "Role revoked");
    } else {
        tracing::warn!(%user_id, "User had no role");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_is_case_insensitive() {
        assert!(matches!(parse_role(" Admin "), Ok(AdminRole::Admin)));
        assert!(matches!(parse_role("super_admin"), Err(AdminError::InvalidRole(_))));
    }

    #[test]
    fn test_parse_user_requires_uuid() {
        assert!(parse_user("0b7e7a52-5d0f-4a43-9a3e-0d7f3c1d2e4f").is_ok());
        assert!(matches!(parse_user("42"), Err(AdminError::InvalidUser(_))));
    }
}
