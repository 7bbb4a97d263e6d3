//! Shipping quotes backed by the configured rate bands.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use petshop_core::cart::Cart;
use petshop_core::shipping::{
    ShippingError, ShippingQuote, check_weight, parcel_weight, resolve_shipping,
};
use petshop_core::{Cep, CepError, UserId};

use crate::db::{CartRepository, RepositoryError, ShippingRateRepository};

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error(transparent)]
    Cep(#[from] CepError),

    #[error(transparent)]
    Shipping(#[from] ShippingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Quote a parcel of `weight_kg` to `cep`.
///
/// The CEP and weight are validated before the rate bands are loaded.
///
/// # Errors
///
/// Returns `QuoteError::Cep` for a malformed CEP, `QuoteError::Shipping`
/// for a negative or oversized weight or an unserved region.
#[tracing::instrument(skip(pool))]
pub async fn quote(pool: &PgPool, cep: &str, weight_kg: Decimal) -> Result<ShippingQuote, QuoteError> {
    let cep = Cep::parse(cep)?;
    check_weight(weight_kg)?;
    let bands = ShippingRateRepository::new(pool).active_bands().await?;
    Ok(resolve_shipping(&bands, &cep, weight_kg)?)
}

/// Quote the caller's current cart to `cep`.
///
/// # Errors
///
/// As [`quote`].
pub async fn quote_cart(pool: &PgPool, user_id: UserId, cep: &str) -> Result<ShippingQuote, QuoteError> {
    let cep = Cep::parse(cep)?;
    let cart = CartRepository::new(pool).get(user_id).await?;
    let bands = ShippingRateRepository::new(pool).active_bands().await?;
    Ok(resolve_shipping(&bands, &cep, cart_weight(&cart))?)
}

/// Parcel weight of a cart.
#[must_use]
pub fn cart_weight(cart: &Cart) -> Decimal {
    parcel_weight(cart.parcel_lines())
}
