//! Pet shop back-office API server (port 3001).

#![cfg_attr(not(test), forbid(unsafe_code))]

use petshop_admin::app;
use petshop_admin::config::AdminConfig;
use petshop_admin::state::AppState;
use petshop_storefront::db;
use petshop_storefront::telemetry::{self, SentrySettings};

#[tokio::main]
async fn main() {
    let config = AdminConfig::from_env().expect("Failed to load configuration");

    let sentry_guard = telemetry::init_sentry(SentrySettings {
        release: sentry::release_name!(),
        dsn: config.sentry_dsn.as_deref(),
        environment: config.sentry_environment.as_deref(),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
    });
    telemetry::init_tracing("petshop_admin=info,petshop_storefront=info,tower_http=debug");
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created");

    let addr = config.socket_addr();
    let state = AppState::new(config, pool).expect("Failed to initialize application state");

    tracing::info!("admin listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await
        .expect("Server error");
}
