//! Shipping rate bands as stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use petshop_core::ShippingRateId;
use petshop_core::shipping::RateBand;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShippingRate {
    pub id: ShippingRateId,
    pub cep_start: String,
    pub cep_end: String,
    pub fixed_fee: Decimal,
    pub per_kg_fee: Decimal,
    pub lead_time_days: i32,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ShippingRate> for RateBand {
    fn from(rate: ShippingRate) -> Self {
        Self {
            id: rate.id,
            cep_start: rate.cep_start,
            cep_end: rate.cep_end,
            fixed_fee: rate.fixed_fee,
            per_kg_fee: rate.per_kg_fee,
            lead_time_days: rate.lead_time_days,
            description: rate.description,
        }
    }
}
