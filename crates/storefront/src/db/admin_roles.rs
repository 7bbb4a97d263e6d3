//! Back-office role grants.

use sqlx::PgPool;

use petshop_core::{AdminRole, UserId};

use super::RepositoryError;

/// Repository for `admin_user_role` rows.
pub struct AdminRoleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdminRoleRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's back-office role, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn role_of(&self, user_id: UserId) -> Result<Option<AdminRole>, RepositoryError> {
        let role = sqlx::query_scalar::<_, AdminRole>(
            "SELECT role FROM petshop.admin_user_role WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(role)
    }

    /// Grant (or change) a user's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn grant(&self, user_id: UserId, role: AdminRole) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO petshop.admin_user_role (user_id, role)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
            ",
        )
        .bind(user_id)
        .bind(role)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove a user's role. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn revoke(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM petshop.admin_user_role WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
