use crate::auth::{is_key_valid, resolve_api_key};
use crate::orchestrator::score_transaction;
use crate::persistence::PersistenceGateway;
use crate::state::AppState;
use crate::types::CreateTransactionRequest;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use common_http_errors::ApiError;
use serde_json::json;
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let cache_ok = state.cache.ping().await;
    let persistence_ok = state.persistence.ready().await.is_ok();

    if cache_ok && persistence_ok {
        (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "cache": cache_ok,
                "persistence": persistence_ok,
            })),
        )
            .into_response()
    }
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}

pub async fn score_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateTransactionRequest>,
) -> Response {
    let trace_id = Some(Uuid::new_v4());
    let started = Instant::now();

    let response = handle_score(&state, headers, request, trace_id).await;

    let status = match &response {
        Ok(_) => 200,
        Err(err) => status_for(err),
    };
    state.metrics.record_request("/api/v1/fraud/score", status);
    state.metrics.observe_request_latency_ms(started.elapsed().as_secs_f64() * 1000.0);

    match response {
        Ok((resp, remaining, limit)) => {
            let mut http_response = (StatusCode::OK, Json(resp)).into_response();
            insert_rate_limit_headers(&mut http_response, limit, remaining);
            http_response
        }
        Err(err) => err.into_response(),
    }
}

async fn handle_score(
    state: &AppState,
    headers: HeaderMap,
    request: CreateTransactionRequest,
    trace_id: Option<Uuid>,
) -> Result<(crate::types::ScoreResponse, i64, u32), ApiError> {
    let presented_key = headers
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("missing X-API-Key header", trace_id))?;

    let persistence = &state.persistence;
    let key_record = resolve_api_key(
        presented_key,
        &state.config.api_key_salt,
        &state.auth_cache,
        &state.metrics,
        |hash| lookup_key(persistence, hash),
    )
    .await
    .ok_or_else(|| ApiError::unauthorized("invalid API key", trace_id))?;

    if !is_key_valid(&key_record, Utc::now()) {
        return Err(ApiError::unauthorized("API key is inactive or expired", trace_id));
    }

    let limit = key_record.rate_limit.max(1) as u32;
    let decision = state
        .rate_limiter
        .check(
            &key_record.id.to_string(),
            limit,
            state.config.rate_limit_window_secs,
            Utc::now().timestamp_millis(),
            &state.metrics,
        )
        .await;

    if !decision.allowed {
        return Err(ApiError::quota_exceeded(
            state.config.rate_limit_window_secs,
            limit,
            decision.remaining(),
            trace_id,
        ));
    }

    // Best-effort usage bookkeeping; must never fail the request.
    {
        let persistence = state.persistence.clone();
        let key_id = key_record.id;
        tokio::spawn(async move {
            if let Err(err) = persistence.increment_api_key_usage(key_id).await {
                warn!(error = %err, key_id = %key_id, "failed to bump API key usage counters");
            }
        });
    }

    let response = score_transaction(state, request, trace_id).await?;
    Ok((response, decision.remaining(), limit))
}

async fn lookup_key(persistence: &PersistenceGateway, hash: String) -> anyhow::Result<Option<crate::types::ApiKeyRecord>> {
    persistence.find_api_key_by_hash(&hash).await
}

fn insert_rate_limit_headers(response: &mut Response, limit: u32, remaining: i64) {
    let headers = response.headers_mut();
    if let Ok(val) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert("X-RateLimit-Limit", val);
    }
    if let Ok(val) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", val);
    }
}

fn status_for(err: &ApiError) -> u16 {
    match err {
        ApiError::Validation { .. } => 400,
        ApiError::BadRequest { .. } => 400,
        ApiError::Unauthorized { .. } => 401,
        ApiError::Forbidden { .. } | ApiError::ForbiddenMissingRole { .. } => 403,
        ApiError::NotFound { .. } => 404,
        ApiError::QuotaExceeded { .. } => 429,
        ApiError::DependencyUnavailable { .. }
        | ApiError::PersistenceWrite { .. }
        | ApiError::Internal { .. } => 500,
    }
}
