//! Pet shop storefront API server (port 3000).
//!
//! # Security
//!
//! This binary only has access to:
//! - The shop `PostgreSQL` database
//! - The serverless functions (payment sessions, e-mail, calendar)
//! - `ViaCEP` for address lookups
//!
//! Customers authenticate with the auth provider's access tokens; this
//! binary never sees passwords.

#![cfg_attr(not(test), forbid(unsafe_code))]

use petshop_storefront::config::StorefrontConfig;
use petshop_storefront::state::AppState;
use petshop_storefront::telemetry::{self, SentrySettings};
use petshop_storefront::{app, db};

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = telemetry::init_sentry(SentrySettings {
        release: sentry::release_name!(),
        dsn: config.sentry_dsn.as_deref(),
        environment: config.sentry_environment.as_deref(),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
    });
    telemetry::init_tracing("petshop_storefront=info,tower_http=debug");
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p petshop-cli -- migrate

    let addr = config.socket_addr();
    let state = AppState::new(config, pool).expect("Failed to initialize application state");
    let app = app(state);

    tracing::info!("storefront listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await
        .expect("Server error");
}
