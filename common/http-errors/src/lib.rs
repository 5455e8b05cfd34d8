use axum::{http::{StatusCode, HeaderValue}, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    /// Human-readable error description. Always present on every error
    /// response, never omitted even when `code` alone would be enough.
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")] pub missing_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")] pub trace_id: Option<Uuid>,
}

#[derive(Debug)]
pub enum ApiError {
    ForbiddenMissingRole { role: &'static str, trace_id: Option<Uuid> },
    Forbidden { trace_id: Option<Uuid> },
    BadRequest { code: &'static str, trace_id: Option<Uuid>, message: Option<String> },
    NotFound { code: &'static str, trace_id: Option<Uuid> },
    Internal { trace_id: Option<Uuid>, message: Option<String> },
    /// Request body failed a field-level validation rule.
    Validation { trace_id: Option<Uuid>, message: String },
    /// Missing, malformed, unknown, inactive, or expired API key.
    Unauthorized { trace_id: Option<Uuid>, message: String },
    /// Caller exceeded their rate limit. `retry_after_secs` drives the
    /// `Retry-After` header; `limit`/`remaining` drive `X-RateLimit-Limit`
    /// and `X-RateLimit-Remaining` so a 429 carries the same rate-limit
    /// headers as a successful response.
    QuotaExceeded { trace_id: Option<Uuid>, retry_after_secs: u64, limit: u32, remaining: i64 },
    /// A downstream dependency (cache, persistence) could not be reached within the deadline.
    DependencyUnavailable { trace_id: Option<Uuid>, message: String },
    /// The final write of a scored record failed; the response must not be sent as a success.
    PersistenceWrite { trace_id: Option<Uuid>, message: String },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E, trace_id: Option<Uuid>) -> Self { Self::Internal { trace_id, message: Some(e.to_string()) } }
    pub fn bad_request(code: &'static str, trace_id: Option<Uuid>) -> Self { Self::BadRequest { code, trace_id, message: None } }
    pub fn validation(message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::Validation { trace_id, message: message.into() }
    }
    pub fn unauthorized(message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::Unauthorized { trace_id, message: message.into() }
    }
    pub fn quota_exceeded(retry_after_secs: u64, limit: u32, remaining: i64, trace_id: Option<Uuid>) -> Self {
        Self::QuotaExceeded { trace_id, retry_after_secs, limit, remaining }
    }
    pub fn dependency_unavailable(message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::DependencyUnavailable { trace_id, message: message.into() }
    }
    pub fn persistence_write(message: impl Into<String>, trace_id: Option<Uuid>) -> Self {
        Self::PersistenceWrite { trace_id, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code) = match self {
            ApiError::ForbiddenMissingRole { role, trace_id } => (
                StatusCode::FORBIDDEN,
                ErrorBody { code: "missing_role".into(), detail: format!("missing required role: {role}"), missing_role: Some(role.into()), trace_id },
                "missing_role"
            ),
            ApiError::Forbidden { trace_id } => (
                StatusCode::FORBIDDEN,
                ErrorBody { code: "forbidden".into(), detail: "forbidden".into(), missing_role: None, trace_id },
                "forbidden"
            ),
            ApiError::BadRequest { code, trace_id, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: code.into(), detail: message.unwrap_or_else(|| code.to_string()), missing_role: None, trace_id },
                code
            ),
            ApiError::NotFound { code, trace_id } => (
                StatusCode::NOT_FOUND,
                ErrorBody { code: code.into(), detail: code.to_string(), missing_role: None, trace_id },
                code
            ),
            ApiError::Internal { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "internal_error".into(), detail: message.unwrap_or_else(|| "internal error".into()), missing_role: None, trace_id },
                "internal_error"
            ),
            ApiError::Validation { trace_id, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: "validation_error".into(), detail: message, missing_role: None, trace_id },
                "validation_error"
            ),
            ApiError::Unauthorized { trace_id, message } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { code: "unauthorized".into(), detail: message, missing_role: None, trace_id },
                "unauthorized"
            ),
            ApiError::QuotaExceeded { trace_id, retry_after_secs, limit, remaining } => {
                let body = ErrorBody {
                    code: "quota_exceeded".into(),
                    detail: format!("Rate limit exceeded, retry after {retry_after_secs}s"),
                    missing_role: None,
                    trace_id,
                };
                let mut resp = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                if let Ok(val) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    resp.headers_mut().insert("Retry-After", val);
                }
                if let Ok(val) = HeaderValue::from_str(&limit.to_string()) {
                    resp.headers_mut().insert("X-RateLimit-Limit", val);
                }
                if let Ok(val) = HeaderValue::from_str(&remaining.to_string()) {
                    resp.headers_mut().insert("X-RateLimit-Remaining", val);
                }
                if let Ok(val) = HeaderValue::from_str("quota_exceeded") {
                    resp.headers_mut().insert("X-Error-Code", val);
                }
                return resp;
            }
            ApiError::DependencyUnavailable { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "dependency_unavailable".into(), detail: message, missing_role: None, trace_id },
                "dependency_unavailable"
            ),
            ApiError::PersistenceWrite { trace_id, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "persistence_write_failed".into(), detail: message, missing_role: None, trace_id },
                "persistence_write_failed"
            ),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
