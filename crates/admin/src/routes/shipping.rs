//! Shipping rate bands.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use petshop_core::ShippingRateId;
use petshop_storefront::db::ShippingRateRepository;
use petshop_storefront::db::shipping::ShippingRateInput;
use petshop_storefront::error::{AppError, Result};
use petshop_storefront::models::ShippingRate;

use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shipping-rates", get(list).post(create))
        .route("/api/shipping-rates/{id}", put(update).delete(remove))
}

async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ShippingRate>>> {
    Ok(Json(ShippingRateRepository::new(state.pool()).list().await?))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Json(input): Json<ShippingRateInput>,
) -> Result<(StatusCode, Json<ShippingRate>)> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let rate = ShippingRateRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(rate)))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<ShippingRateId>,
    Json(input): Json<ShippingRateInput>,
) -> Result<Json<ShippingRate>> {
    let input = input.normalized().map_err(AppError::BadRequest)?;
    Ok(Json(ShippingRateRepository::new(state.pool()).update(id, &input).await?))
}

#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
async fn remove(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<ShippingRateId>,
) -> Result<StatusCode> {
    ShippingRateRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
