use crate::decision::decide;
use crate::features;
use crate::state::AppState;
use crate::types::{CreateTransactionRequest, ScoreResponse, TransactionDetails};
use crate::validation::{validate_transaction, ValidationError};
use crate::velocity::VelocityAggregator;
use common_http_errors::ApiError;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Orchestrates one scoring request end to end: validate, fetch velocity,
/// extract features, infer, decide, persist, respond. A 200 from this
/// function guarantees the transaction was durably persisted.
pub async fn score_transaction(
    state: &AppState,
    request: CreateTransactionRequest,
    trace_id: Option<Uuid>,
) -> Result<ScoreResponse, ApiError> {
    let started = Instant::now();

    let tx = validate_transaction(request).map_err(|err: ValidationError| {
        ApiError::validation(err.to_string(), trace_id)
    })?;

    let velocity_aggregator = VelocityAggregator::new(
        &state.cache,
        &state.persistence,
        &state.metrics,
        state.config.cache_velocity_ttl_secs,
        state.config.cache_ip_history_ttl_secs,
        state.config.cache_customer_history_ttl_secs,
    );
    let velocity = velocity_aggregator
        .snapshot(&tx.customer_email, &tx.customer_ip)
        .await
        .map_err(|err| {
            ApiError::dependency_unavailable(format!("velocity lookup failed: {err}"), trace_id)
        })?;

    let feature_started = Instant::now();
    let feature_vector = features::extract(&tx, &velocity);
    state
        .metrics
        .observe_feature_extraction_ms(feature_started.elapsed().as_secs_f64() * 1000.0);

    let model_started = Instant::now();
    let prediction = state.model.predict(&feature_vector, &tx, &velocity);
    state.metrics.observe_model_prediction_ms(model_started.elapsed().as_secs_f64() * 1000.0);
    if !prediction.model_used {
        state.metrics.record_model_fallback();
    }

    let fraud_score = round4(prediction.probability);
    let (risk_level, recommendation) = decide(
        fraud_score,
        state.config.fraud_score_low_threshold,
        state.config.fraud_score_medium_threshold,
        state.config.fraud_score_high_threshold,
    );

    debug!(
        transaction_id = %tx.transaction_id,
        fraud_score,
        risk_level = risk_level.as_str(),
        recommendation = recommendation.as_str(),
        model_used = prediction.model_used,
        "scored transaction"
    );

    let persistence_started = Instant::now();
    let record = state
        .persistence
        .insert_transaction(&tx, fraud_score, risk_level.as_str(), recommendation.as_str())
        .await
        .map_err(|err| {
            ApiError::persistence_write(format!("failed to persist scored transaction: {err}"), trace_id)
        })?;
    state
        .metrics
        .observe_persistence_query_ms(persistence_started.elapsed().as_secs_f64() * 1000.0);

    state.metrics.observe_fraud_score(fraud_score);
    state.metrics.record_risk_level(risk_level.as_str());
    state.metrics.record_recommendation(recommendation.as_str());

    info!(
        transaction_id = %tx.transaction_id,
        record_id = %record.id,
        fraud_score,
        "transaction scored and persisted"
    );

    Ok(ScoreResponse {
        transaction_id: record.id,
        fraud_score,
        risk_level: risk_level.as_str(),
        recommendation: recommendation.as_str(),
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        timestamp: record.created_at,
        details: TransactionDetails {
            amount: tx.amount,
            currency: tx.currency,
            customer_email: tx.customer_email,
            velocity_checks: velocity,
        },
    })
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
