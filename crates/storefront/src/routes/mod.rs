//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database)
//!
//! # Catalog
//! GET  /api/products                        - Filtered, sorted, paginated listing
//! GET  /api/products/{id}                   - Detail with rating summary
//! GET  /api/products/{id}/reviews           - Reviews
//! POST /api/products/{id}/reviews           - Create or replace my review
//! GET  /api/categories                      - Categories of active products
//!
//! # Cart & favorites (auth)
//! GET  /api/cart                            - My cart
//! POST /api/cart                            - Add (increments)
//! PUT  /api/cart/{product_id}               - Set quantity (0 removes)
//! DELETE /api/cart/{product_id}             - Remove
//! GET  /api/favorites                       - My favorites
//! PUT|DELETE /api/favorites/{product_id}    - Toggle
//!
//! # Shipping
//! GET  /api/shipping/quote?cep=&weight=     - Quote a parcel
//! GET  /api/shipping/cart-quote?cep=        - Quote my cart (auth)
//! GET  /api/cep/{cep}                       - Address lookup
//!
//! # Checkout & orders (auth)
//! POST /api/checkout                        - Place order
//! GET  /api/checkout/verify                 - Confirm hosted payment
//! GET  /api/orders                          - My orders
//! GET  /api/orders/{id}                     - Order with items
//! POST /api/orders/{id}/cancel              - Cancel
//!
//! # Booking
//! GET  /api/services                        - Bookable services
//! GET  /api/appointments/availability       - Slots of a day
//! POST /api/appointments                    - Book (auth)
//! GET  /api/appointments                    - My appointments (auth)
//! GET|POST /api/pets                        - My pets (auth)
//!
//! # Blog
//! GET  /api/blog                            - Published posts
//! GET  /api/blog/{slug}                     - Rendered post
//! ```

pub mod appointments;
pub mod blog;
pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod products;
pub mod shipping;

use axum::{Router, extract::State, http::StatusCode, routing::get};

use crate::state::AppState;

/// Liveness and readiness probes. Never rate limited.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
}

/// Read-mostly API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(cart::router())
        .merge(favorites::router())
        .merge(shipping::router())
        .merge(checkout::router())
        .merge(appointments::router())
        .merge(blog::router())
}

/// Routes that create orders or appointments.
pub fn submit_routes() -> Router<AppState> {
    Router::new()
        .merge(checkout::submit_router())
        .merge(appointments::submit_router())
}

/// Liveness health check. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check: 503 when the database is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
