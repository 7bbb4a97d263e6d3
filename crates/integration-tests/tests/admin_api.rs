//! Back-office API behavior that does not need a live database.

use axum::http::StatusCode;

use petshop_integration_tests::{admin_app, get, json_body, post_json, send, token_signed_with};

#[tokio::test]
async fn test_health_is_ok() {
    let response = send(admin_app(), get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_requires_token() {
    let response = send(admin_app(), get("/api/dashboard", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Authentication required");
}

#[tokio::test]
async fn test_writes_require_valid_token() {
    let forged = token_signed_with("another-secret-entirely-9$Lp2#Qw7!");
    let body = serde_json::json!({ "stock": 3 });
    let response = send(
        admin_app(),
        post_json("/api/products", &body, Some(&forged)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
