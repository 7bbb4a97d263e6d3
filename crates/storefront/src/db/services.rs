//! Bookable services.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use petshop_core::ServiceId;

use super::RepositoryError;
use crate::models::Service;

const SERVICE_COLUMNS: &str = "id, name, description, price, duration_minutes, active";

/// A service as edited in the back office or seeded from YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl ServiceInput {
    /// # Errors
    ///
    /// Returns a user-facing message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        if self.price.is_sign_negative() {
            return Err("price cannot be negative".to_string());
        }
        if self.duration_minutes <= 0 {
            return Err("duration_minutes must be positive".to_string());
        }
        Ok(())
    }
}

pub struct ServiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ServiceRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Services, by name. Inactive ones only when `include_inactive`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Service>, RepositoryError> {
        let services = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM petshop.service WHERE active OR $1 ORDER BY name"
        ))
        .bind(include_inactive)
        .fetch_all(self.pool)
        .await?;
        Ok(services)
    }

    /// Active services with the given ids, in the order the ids were given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if any id is unknown or inactive.
    pub async fn get_active(&self, ids: &[ServiceId]) -> Result<Vec<Service>, RepositoryError> {
        let raw: Vec<i64> = ids.iter().map(ServiceId::as_i64).collect();
        let found = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM petshop.service WHERE active AND id = ANY($1)"
        ))
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        ids.iter()
            .map(|id| {
                found
                    .iter()
                    .find(|s| s.id == *id)
                    .cloned()
                    .ok_or(RepositoryError::NotFound)
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create(&self, input: &ServiceInput) -> Result<Service, RepositoryError> {
        sqlx::query_as::<_, Service>(&format!(
            r"
            INSERT INTO petshop.service (name, description, price, duration_minutes, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SERVICE_COLUMNS}
            "
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.duration_minutes)
        .bind(input.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a service with this name already exists"))
    }

    /// Insert or update a service by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_by_name(&self, input: &ServiceInput) -> Result<Service, RepositoryError> {
        let service = sqlx::query_as::<_, Service>(&format!(
            r"
            INSERT INTO petshop.service (name, description, price, duration_minutes, active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (name) DO UPDATE
            SET description = EXCLUDED.description, price = EXCLUDED.price,
                duration_minutes = EXCLUDED.duration_minutes, active = EXCLUDED.active
            RETURNING {SERVICE_COLUMNS}
            "
        ))
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.duration_minutes)
        .bind(input.active)
        .fetch_one(self.pool)
        .await?;
        Ok(service)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the service does not exist.
    pub async fn update(&self, id: ServiceId, input: &ServiceInput) -> Result<Service, RepositoryError> {
        sqlx::query_as::<_, Service>(&format!(
            r"
            UPDATE petshop.service
            SET name = $2, description = $3, price = $4, duration_minutes = $5, active = $6
            WHERE id = $1
            RETURNING {SERVICE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.price)
        .bind(input.duration_minutes)
        .bind(input.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "a service with this name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }
}
