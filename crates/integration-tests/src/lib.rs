//! Shared fixtures for router-level integration tests.
//!
//! The apps are built exactly as the binaries build them, but over a pool
//! that never connects: tests only exercise paths that answer before the
//! database is touched (health, authentication, request validation).
//!
//! ```bash
//! cargo test -p petshop-integration-tests
//! ```

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header::AUTHORIZATION},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use petshop_admin::config::AdminConfig;
use petshop_storefront::config::{AuthConfig, FunctionsConfig, StorefrontConfig};

/// Signing secret shared by the fixtures and [`token_for`].
pub const JWT_SECRET: &str = "Zq4!vN8#tL2@rX6$kB9%mC3^hW7&jF1*";
const AUDIENCE: &str = "authenticated";

fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://petshop@127.0.0.1:1/petshop")
        .unwrap_or_else(|e| panic!("invalid database url: {e}"))
}

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SecretString::from(JWT_SECRET.to_owned()),
        audience: AUDIENCE.to_owned(),
    }
}

/// Storefront configuration pointing at unroutable upstreams.
#[must_use]
pub fn storefront_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://petshop@127.0.0.1:1/petshop".to_owned()),
        host: [127, 0, 0, 1].into(),
        port: 3000,
        base_url: "https://loja.petshop.test".to_owned(),
        auth: auth_config(),
        functions: FunctionsConfig {
            url: "http://127.0.0.1:1/functions".to_owned(),
            api_key: SecretString::from("fn-key-Yh3#pQ9!wE5".to_owned()),
        },
        viacep_base_url: "http://127.0.0.1:1".to_owned(),
        whatsapp_number: Some("5511999990000".to_owned()),
        utc_offset_hours: -3,
        rate_limit: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The storefront app over a lazy pool.
#[must_use]
pub fn storefront_app() -> Router {
    let state = petshop_storefront::state::AppState::new(storefront_config(), lazy_pool())
        .unwrap_or_else(|e| panic!("storefront state: {e}"));
    petshop_storefront::app(state)
}

/// The back-office app over a lazy pool.
#[must_use]
pub fn admin_app() -> Router {
    let config = AdminConfig {
        database_url: SecretString::from("postgres://petshop@127.0.0.1:1/petshop".to_owned()),
        host: [127, 0, 0, 1].into(),
        port: 3001,
        auth: auth_config(),
        utc_offset_hours: -3,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let state = petshop_admin::state::AppState::new(config, lazy_pool())
        .unwrap_or_else(|e| panic!("admin state: {e}"));
    petshop_admin::app(state)
}

/// A valid access token for a fresh user, signed with `secret`.
#[must_use]
pub fn token_signed_with(secret: &str) -> String {
    let claims = serde_json::json!({
        "sub": Uuid::new_v4().to_string(),
        "email": "tutor@petshop.test",
        "aud": AUDIENCE,
        "exp": chrono::Utc::now().timestamp() + 3600,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap_or_else(|e| panic!("token encoding: {e}"))
}

/// A valid access token for a fresh user.
#[must_use]
pub fn token() -> String {
    token_signed_with(JWT_SECRET)
}

/// `GET uri`, optionally with a bearer token.
#[must_use]
pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::empty())
        .unwrap_or_else(|e| panic!("request: {e}"))
}

/// `POST uri` with a JSON body, optionally with a bearer token.
#[must_use]
pub fn post_json(uri: &str, body: &serde_json::Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|e| panic!("request: {e}"))
}

/// Send one request through `app`.
pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request)
        .await
        .unwrap_or_else(|e| match e {})
}

/// Read a JSON response body.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap_or_else(|e| panic!("body: {e}"));
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("json: {e}"))
}
