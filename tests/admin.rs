//! Admin metaobject endpoint tests: key guard and shop selection

mod common;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::Value;
use tower::ServiceExt;

fn get(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(key) = key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Option<Value>) {
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).ok())
}

#[tokio::test]
async fn test_admin_endpoints_disabled_without_key() {
    let mut config = test_config();
    config.admin_api_key = None;
    let state = create_test_app_state_with(&config);

    let (status, body) = send(
        &state,
        get("/api/metaobjects?shop=acme-goods.myshopify.com", Some("anything")),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = body.unwrap();
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["details"], "/api/metaobjects");
}

#[tokio::test]
async fn test_admin_requires_matching_key() {
    let state = create_test_app_state();
    let uri = "/api/metaobjectDefinitions?shop=acme-goods.myshopify.com";

    let (missing, _) = send(&state, get(uri, None)).await;
    let (wrong, body) = send(&state, get(uri, Some("sk_admin_wrong"))).await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, StatusCode::UNAUTHORIZED);
    assert_eq!(body.unwrap()["error"], "Unauthorized");
}

#[tokio::test]
async fn test_admin_requires_shop_param() {
    let state = create_test_app_state();

    let (status, body) = send(&state, get("/api/metaobjects", Some(TEST_ADMIN_KEY))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.unwrap()["error"], "Bad request");
}

#[tokio::test]
async fn test_admin_rejects_invalid_shop_domain() {
    let state = create_test_app_state();

    let (status, _) = send(
        &state,
        get("/api/metaobjects?shop=evil.example.com", Some(TEST_ADMIN_KEY)),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_shop_without_session_is_not_found() {
    let state = create_test_app_state();

    let (status, body) = send(
        &state,
        get("/api/metaobjects?shop=acme-goods.myshopify.com", Some(TEST_ADMIN_KEY)),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = body.unwrap();
    assert_eq!(body["error"], "Session not found");
    assert_eq!(body["details"], TEST_SHOP);
}

#[tokio::test]
async fn test_graphql_proxy_rejects_malformed_body() {
    let state = create_test_app_state();
    let request = Request::builder()
        .method("POST")
        .uri("/api/graphql?shop=acme-goods.myshopify.com")
        .header("Authorization", format!("Bearer {}", TEST_ADMIN_KEY))
        .header("content-type", "application/json")
        .body(Body::from("{\"variables\": {}}"))
        .unwrap();

    let (status, _) = send(&state, request).await;

    assert!(
        status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY,
        "missing query field should be rejected, got {}",
        status
    );
}
