//! Favorite products.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use petshop_core::ProductId;

use crate::db::{FavoriteRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/favorites", get(list_favorites))
        .route(
            "/api/favorites/{product_id}",
            put(add_favorite).delete(remove_favorite),
        )
}

async fn list_favorites(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(FavoriteRepository::new(state.pool()).list(user.id).await?))
}

async fn add_favorite(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;
    FavoriteRepository::new(state.pool())
        .add(user.id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_favorite(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<StatusCode> {
    if FavoriteRepository::new(state.pool())
        .remove(user.id, product_id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("favorite {product_id}")))
    }
}
