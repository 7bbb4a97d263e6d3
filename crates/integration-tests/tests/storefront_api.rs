#![allow(clippy::unwrap_used)]

//! Storefront API behavior that does not need a live database.

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};

use petshop_integration_tests::{
    get, json_body, post_json, send, storefront_app, token, token_signed_with,
};

#[tokio::test]
async fn test_health_is_ok_with_security_headers() {
    let response = send(storefront_app(), get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key("x-request-id"));

    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_upstream_request_id_echoed() {
    let request = Request::get("/health")
        .header("x-request-id", "edge-7f3a")
        .body(Body::empty())
        .unwrap();
    let response = send(storefront_app(), request).await;
    assert_eq!(response.headers()["x-request-id"], "edge-7f3a");
}

#[tokio::test]
async fn test_cart_requires_token() {
    let response = send(storefront_app(), get("/api/cart", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Authentication required");
}

#[tokio::test]
async fn test_token_from_other_issuer_rejected() {
    let forged = token_signed_with("another-secret-entirely-9$Lp2#Qw7!");
    let response = send(storefront_app(), get("/api/orders", Some(&forged))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "no-store, max-age=0"
    );
}

#[tokio::test]
async fn test_checkout_requires_token() {
    let body = serde_json::json!({ "payment_method": "pix" });
    let response = send(storefront_app(), post_json("/api/checkout", &body, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_cep_rejected_before_lookup() {
    let response = send(storefront_app(), get("/api/cep/123", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quote_with_malformed_cep_rejected() {
    let response = send(
        storefront_app(),
        get("/api/shipping/quote?cep=abc&weight=1.5", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_quote_with_oversized_weight_rejected() {
    for weight in ["1000.5", "79228162514264337593543950335"] {
        let uri = format!("/api/shipping/quote?cep=01310100&weight={weight}");
        let response = send(storefront_app(), get(&uri, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "weight {weight}");
        assert_eq!(
            json_body(response).await["error"],
            "weight cannot exceed 1000 kg"
        );
    }
}

#[tokio::test]
async fn test_cart_quote_with_token_and_bad_cep_rejected() {
    let token = token();
    let response = send(
        storefront_app(),
        get("/api/shipping/cart-quote?cep=0000", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_availability_of_past_day_rejected() {
    let response = send(
        storefront_app(),
        get("/api/appointments/availability?date=2020-01-06", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inverted_price_range_rejected() {
    let response = send(
        storefront_app(),
        get("/api/products?min_price=50&max_price=10", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "min_price cannot be greater than max_price"
    );
}

#[tokio::test]
async fn test_cors_preflight_from_web_app() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/products")
        .header(header::ORIGIN, "https://loja.petshop.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let response = send(storefront_app(), request).await;

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://loja.petshop.test"
    );
}
