//! Catalog management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;

use petshop_core::ProductId;
use petshop_storefront::db::ProductRepository;
use petshop_storefront::db::products::{ProductFilter, ProductInput};
use petshop_storefront::error::{AppError, Result};
use petshop_storefront::models::{Page, Pagination, Product};
use petshop_storefront::routes::products::CatalogQuery;

use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

const PER_PAGE: u32 = 50;
const MAX_PER_PAGE: u32 = 200;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/{id}", get(show).put(update).delete(deactivate))
        .route("/api/products/{id}/stock", put(set_stock))
}

/// Same filters as the storefront catalog, deactivated products included.
fn filter(query: &CatalogQuery) -> ProductFilter {
    ProductFilter {
        category: query.category.clone(),
        brand: query.brand.clone(),
        pet_type: query.pet_type,
        search: query.search.clone(),
        min_price: query.min_price,
        max_price: query.max_price,
        include_inactive: true,
    }
}

async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Product>>> {
    let pagination = Pagination::new(query.page, query.per_page, PER_PAGE, MAX_PER_PAGE);
    let page = ProductRepository::new(state.pool())
        .list(&filter(&query), query.sort, pagination)
        .await?;
    Ok(Json(page))
}

async fn show(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn create(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    input.validate().map_err(AppError::BadRequest)?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[tracing::instrument(skip(state, admin, input), fields(admin_id = %admin.user.id))]
async fn update(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<Product>> {
    input.validate().map_err(AppError::BadRequest)?;
    Ok(Json(ProductRepository::new(state.pool()).update(id, &input).await?))
}

/// Products are never deleted: past orders keep pointing at them.
#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
async fn deactivate(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).set_active(id, false).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StockBody {
    pub stock: i32,
}

#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
async fn set_stock(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<StockBody>,
) -> Result<StatusCode> {
    if body.stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".to_owned()));
    }
    ProductRepository::new(state.pool()).set_stock(id, body.stock).await?;
    Ok(StatusCode::NO_CONTENT)
}
