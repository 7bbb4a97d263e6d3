//! Pet shop storefront API.
//!
//! JSON API behind the customer-facing web app: catalog, cart, favorites,
//! shipping quotes, checkout, grooming bookings and the blog. Built as a
//! library so the admin binary and the integration tests can reuse its
//! state, repositories and router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use tower_http::cors::CorsLayer;

use crate::middleware::{
    api_rate_limiter, request_id_middleware, security_headers_middleware, write_rate_limiter,
};
use crate::state::AppState;

/// Build the full storefront application.
///
/// Rate limiting follows `config.rate_limit`.
pub fn app(state: AppState) -> Router {
    let rate_limit = state.config().rate_limit;
    let cors = cors_layer(&state.config().base_url);

    let mut submit = routes::submit_routes();
    let mut api = routes::routes();
    if rate_limit {
        match (write_rate_limiter(), api_rate_limiter()) {
            (Some(write), Some(general)) => {
                submit = submit.layer(write);
                api = api.layer(general);
            }
            _ => tracing::warn!("Rate limiter configuration rejected, running without limits"),
        }
    }

    routes::health_routes()
        .merge(api)
        .merge(submit)
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(telemetry::http_trace_layer())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the web app served from `base_url`.
///
/// An unparseable origin yields a layer that allows no cross-origin calls.
fn cors_layer(base_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let origin = url::Url::parse(base_url)
        .ok()
        .map(|url| url.origin().ascii_serialization())
        .and_then(|origin| HeaderValue::from_str(&origin).ok());

    match origin {
        Some(origin) => layer.allow_origin(origin),
        None => layer,
    }
}
