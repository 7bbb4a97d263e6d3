//! Checkout, payment verification and the customer's orders.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use petshop_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderDetail};
use crate::services::checkout::{CheckoutBody, CheckoutService, PlacedOrder, VerifiedPayment};
use crate::state::AppState;

/// Order placement routes, rate limited separately in `main`.
pub fn submit_router() -> Router<AppState> {
    Router::new().route("/api/checkout", post(place_order))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout/verify", get(verify_payment))
        .route("/api/orders", get(my_orders))
        .route("/api/orders/{id}", get(order_detail))
        .route("/api/orders/{id}/cancel", post(cancel_order))
}

fn service(state: &AppState) -> CheckoutService<'_> {
    CheckoutService::new(state.pool(), state.functions(), &state.config().base_url)
}

async fn place_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = service(&state).place_order(&user, &body).await?;
    let order_id = placed.order.order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
    Ok((StatusCode::CREATED, Json(placed)))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub order_id: OrderId,
    pub session_id: String,
}

async fn verify_payment(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<VerifiedPayment>> {
    if query.session_id.trim().is_empty() {
        return Err(AppError::BadRequest("session_id is required".to_owned()));
    }
    let verified = service(&state)
        .verify(&user, query.order_id, query.session_id.trim())
        .await?;
    Ok(Json(verified))
}

async fn my_orders(RequireAuth(user): RequireAuth, State(state): State<AppState>) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).for_user(user.id).await?))
}

async fn order_detail(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .detail(id)
        .await?
        .filter(|detail| detail.order.user_id == user.id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

async fn cancel_order(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = service(&state).cancel(&user, id).await?;
    tracing::info!(order_id = %id, status = %order.status, "Order canceled by customer");
    Ok(Json(order))
}
