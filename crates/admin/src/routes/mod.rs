//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! Reads need any back-office role; writes need `admin`.
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database)
//!
//! GET  /api/dashboard                   - Orders per status, today's agenda, low stock
//!
//! GET|POST /api/products                - List (incl. inactive) / create
//! GET|PUT|DELETE /api/products/{id}     - Show / update / deactivate
//! PUT  /api/products/{id}/stock         - Set stock
//!
//! GET  /api/orders?status=              - List
//! GET  /api/orders/{id}                 - Detail with items
//! PUT  /api/orders/{id}/status          - Set status
//!
//! GET  /api/appointments?date=          - Agenda of a day
//! PUT  /api/appointments/{id}/attended  - Record attendance
//!
//! GET|POST /api/services                - List / create
//! PUT  /api/services/{id}               - Update
//!
//! GET|POST /api/shipping-rates          - List / create
//! PUT|DELETE /api/shipping-rates/{id}   - Update / delete
//!
//! GET|POST /api/blog-posts              - List (drafts incl.) / create
//! PUT|DELETE /api/blog-posts/{id}       - Update / delete
//! ```

pub mod appointments;
pub mod blog;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod services;
pub mod shipping;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(dashboard::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(appointments::router())
        .merge(services::router())
        .merge(shipping::router())
        .merge(blog::router())
}

async fn health() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
