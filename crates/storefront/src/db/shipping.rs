//! Shipping rate bands.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use petshop_core::ShippingRateId;
use petshop_core::shipping::RateBand;
use petshop_core::types::cep::normalize_boundary;

use super::RepositoryError;
use crate::models::ShippingRate;

const RATE_COLUMNS: &str = "id, cep_start, cep_end, fixed_fee, per_kg_fee, lead_time_days, \
     description, active, created_at";

/// A rate band as edited in the back office.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingRateInput {
    pub cep_start: String,
    pub cep_end: String,
    pub fixed_fee: Decimal,
    pub per_kg_fee: Decimal,
    pub lead_time_days: i32,
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

fn boundary(raw: &str, field: &str) -> Result<String, String> {
    let mut digits = 0;
    for c in raw.trim().chars() {
        match c {
            '0'..='9' => digits += 1,
            '-' | '.' | ' ' => {}
            _ => return Err(format!("{field} may only contain digits")),
        }
    }
    if digits == 0 || digits > 8 {
        return Err(format!("{field} must have between 1 and 8 digits"));
    }
    Ok(normalize_boundary(raw))
}

impl ShippingRateInput {
    /// Validate the band and zero-pad its boundaries to 8 digits.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for the first invalid field.
    pub fn normalized(mut self) -> Result<Self, String> {
        self.cep_start = boundary(&self.cep_start, "cep_start")?;
        self.cep_end = boundary(&self.cep_end, "cep_end")?;
        if self.cep_start > self.cep_end {
            return Err("cep_start must not be after cep_end".to_string());
        }
        if self.fixed_fee.is_sign_negative() || self.per_kg_fee.is_sign_negative() {
            return Err("fees cannot be negative".to_string());
        }
        if self.lead_time_days < 0 {
            return Err("lead_time_days cannot be negative".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        Ok(self)
    }
}

pub struct ShippingRateRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingRateRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active bands in creation order, ready for fee resolution.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_bands(&self) -> Result<Vec<RateBand>, RepositoryError> {
        let rates = sqlx::query_as::<_, ShippingRate>(&format!(
            "SELECT {RATE_COLUMNS} FROM petshop.shipping_rate WHERE active ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rates.into_iter().map(RateBand::from).collect())
    }

    /// Every band, active or not, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ShippingRate>, RepositoryError> {
        let rates = sqlx::query_as::<_, ShippingRate>(&format!(
            "SELECT {RATE_COLUMNS} FROM petshop.shipping_rate ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(rates)
    }

    /// Create a band. `input` must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ShippingRateInput) -> Result<ShippingRate, RepositoryError> {
        let rate = sqlx::query_as::<_, ShippingRate>(&format!(
            r"
            INSERT INTO petshop.shipping_rate
                (cep_start, cep_end, fixed_fee, per_kg_fee, lead_time_days, description, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RATE_COLUMNS}
            "
        ))
        .bind(&input.cep_start)
        .bind(&input.cep_end)
        .bind(input.fixed_fee)
        .bind(input.per_kg_fee)
        .bind(input.lead_time_days)
        .bind(input.description.trim())
        .bind(input.active)
        .fetch_one(self.pool)
        .await?;
        Ok(rate)
    }

    /// Replace a band. `input` must already be normalized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the band does not exist.
    pub async fn update(
        &self,
        id: ShippingRateId,
        input: &ShippingRateInput,
    ) -> Result<ShippingRate, RepositoryError> {
        sqlx::query_as::<_, ShippingRate>(&format!(
            r"
            UPDATE petshop.shipping_rate
            SET cep_start = $2, cep_end = $3, fixed_fee = $4, per_kg_fee = $5,
                lead_time_days = $6, description = $7, active = $8
            WHERE id = $1
            RETURNING {RATE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&input.cep_start)
        .bind(&input.cep_end)
        .bind(input.fixed_fee)
        .bind(input.per_kg_fee)
        .bind(input.lead_time_days)
        .bind(input.description.trim())
        .bind(input.active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a band.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the band does not exist.
    pub async fn delete(&self, id: ShippingRateId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM petshop.shipping_rate WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(start: &str, end: &str) -> ShippingRateInput {
        ShippingRateInput {
            cep_start: start.to_string(),
            cep_end: end.to_string(),
            fixed_fee: Decimal::TEN,
            per_kg_fee: Decimal::TWO,
            lead_time_days: 3,
            description: "São Paulo capital".to_string(),
            active: true,
        }
    }

    #[test]
    fn test_boundaries_are_padded() {
        let band = input("1000-000", "01999-999").normalized().unwrap();
        assert_eq!(band.cep_start, "01000000");
        assert_eq!(band.cep_end, "01999999");
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            input("02000000", "01000000").normalized().unwrap_err(),
            "cep_start must not be after cep_end"
        );
    }

    #[test]
    fn test_bad_boundaries_rejected() {
        assert!(input("0100A000", "01999999").normalized().is_err());
        assert!(input("", "01999999").normalized().is_err());
        assert!(input("010000000", "019999999").normalized().is_err());
    }
}
