//! Order follow-up.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use serde::Deserialize;

use petshop_core::{OrderId, OrderStatus};
use petshop_storefront::db::OrderRepository;
use petshop_storefront::error::{AppError, Result};
use petshop_storefront::models::{Order, OrderDetail, Page, Pagination};

use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

const PER_PAGE: u32 = 25;
const MAX_PER_PAGE: u32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list))
        .route("/api/orders/{id}", get(show))
        .route("/api/orders/{id}/status", put(set_status))
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

async fn list(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Page<Order>>> {
    let pagination = Pagination::new(query.page, query.per_page, PER_PAGE, MAX_PER_PAGE);
    let page = OrderRepository::new(state.pool())
        .list(query.status, pagination)
        .await?;
    Ok(Json(page))
}

async fn show(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
}

/// Staff may move an order to any status (e.g. fix a mistaken shipment).
#[tracing::instrument(skip(state, admin), fields(admin_id = %admin.user.id))]
async fn set_status(
    RequireWriter(admin): RequireWriter,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .set_status(id, body.status)
        .await?;
    tracing::info!(order_id = %id, status = %order.status, "Order status changed");
    Ok(Json(order))
}
