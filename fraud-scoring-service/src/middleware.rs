use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Stamps every response with a request id and the standard hardening
/// headers. Mirrors the header set this family of services has always
/// applied at the edge.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-Request-ID", HeaderValue::from_str(&request_id.to_string()).expect("uuid is valid header value"));
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert("X-API-Version", HeaderValue::from_static("1.0.0"));

    response
}
