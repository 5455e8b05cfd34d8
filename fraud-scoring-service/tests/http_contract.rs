use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use common_http_errors::ApiError;
use fraud_scoring_service::handlers::health;
use fraud_scoring_service::middleware::security_headers;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

async fn unauthorized_handler() -> Result<&'static str, ApiError> {
    Err(ApiError::unauthorized("missing X-API-Key header", None))
}

async fn quota_exceeded_handler() -> Result<&'static str, ApiError> {
    Err(ApiError::quota_exceeded(60, 100, 0, None))
}

fn test_app() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/unauthorized", get(unauthorized_handler))
        .route("/quota", get(quota_exceeded_handler))
        .layer(axum::middleware::from_fn(security_headers))
}

#[tokio::test]
async fn health_endpoint_is_ok_and_carries_hardening_headers() {
    let response = test_app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers.get("X-Content-Type-Options").unwrap(), "nosniff");
    assert_eq!(headers.get("X-Frame-Options").unwrap(), "DENY");
    assert!(headers.get("Strict-Transport-Security").is_some());
    assert!(headers.get("X-Request-ID").is_some());
}

#[tokio::test]
async fn unauthorized_error_body_carries_detail_field() {
    let response = test_app()
        .oneshot(Request::builder().uri("/unauthorized").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("X-Error-Code").unwrap(), "unauthorized");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["detail"], "missing X-API-Key header");
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn quota_exceeded_response_carries_rate_limit_headers_and_detail() {
    let response = test_app()
        .oneshot(Request::builder().uri("/quota").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
    assert_eq!(response.headers().get("X-RateLimit-Limit").unwrap(), "100");
    assert_eq!(response.headers().get("X-RateLimit-Remaining").unwrap(), "0");

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Rate limit exceeded"));
}
