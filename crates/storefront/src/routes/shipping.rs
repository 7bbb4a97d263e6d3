//! Shipping quotes and postal-code lookup.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use petshop_core::Cep;
use petshop_core::shipping::ShippingQuote;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::shipping::{quote, quote_cart};
use crate::services::viacep::CepAddress;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping/quote", get(shipping_quote))
        .route("/api/shipping/cart-quote", get(cart_quote))
        .route("/api/cep/{cep}", get(lookup_cep))
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub cep: String,
    pub weight: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CartQuoteQuery {
    pub cep: String,
}

#[tracing::instrument(skip(state))]
async fn shipping_quote(
    State(state): State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<ShippingQuote>> {
    Ok(Json(quote(state.pool(), &query.cep, query.weight).await?))
}

#[tracing::instrument(skip(state, user), fields(user_id = %user.id))]
async fn cart_quote(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<CartQuoteQuery>,
) -> Result<Json<ShippingQuote>> {
    Ok(Json(quote_cart(state.pool(), user.id, &query.cep).await?))
}

#[tracing::instrument(skip(state))]
async fn lookup_cep(State(state): State<AppState>, Path(cep): Path<String>) -> Result<Json<CepAddress>> {
    let cep = Cep::parse(&cep)?;
    Ok(Json(state.viacep().lookup(&cep).await?))
}
