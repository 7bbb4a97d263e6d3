//! Bookable services.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use petshop_core::ServiceId;
use petshop_storefront::db::ServiceRepository;
use petshop_storefront::db::services::ServiceInput;
use petshop_storefront::error::{AppError, Result};
use petshop_storefront::models::Service;

use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/services", get(list).post(create))
        .route("/api/services/{id}", put(update))
}

async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Service>>> {
    Ok(Json(ServiceRepository::new(state.pool()).list(true).await?))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Json(input): Json<ServiceInput>,
) -> Result<(StatusCode, Json<Service>)> {
    input.validate().map_err(AppError::BadRequest)?;
    let service = ServiceRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<ServiceId>,
    Json(input): Json<ServiceInput>,
) -> Result<Json<Service>> {
    input.validate().map_err(AppError::BadRequest)?;
    Ok(Json(ServiceRepository::new(state.pool()).update(id, &input).await?))
}
