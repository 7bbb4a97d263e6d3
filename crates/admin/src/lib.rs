//! Pet shop back-office library.
//!
//! # Security
//!
//! This crate can change prices, stock and order statuses. Every `/api`
//! route checks the caller's role in `admin_user_role`; deploy it on a
//! private network only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;

use petshop_storefront::middleware::{request_id_middleware, security_headers_middleware};
use petshop_storefront::telemetry;

use crate::state::AppState;

/// Build the back-office application.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(telemetry::http_trace_layer())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
