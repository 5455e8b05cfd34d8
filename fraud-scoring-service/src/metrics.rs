use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const LATENCY_BUCKETS_MS: &[f64] = &[
    10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0,
];

#[derive(Clone)]
pub struct FraudMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_latency_ms: Histogram,
    fraud_score_distribution: Histogram,
    risk_level_total: IntCounterVec,
    recommendation_total: IntCounterVec,
    cache_hits_total: IntCounterVec,
    cache_misses_total: IntCounterVec,
    rate_limit_hits_total: IntCounter,
    rate_limit_fail_open_total: IntCounter,
    model_prediction_duration_ms: Histogram,
    model_fallback_total: IntCounter,
    feature_extraction_duration_ms: Histogram,
    persistence_query_duration_ms: Histogram,
    auth_cache_hits_total: IntCounter,
    auth_cache_misses_total: IntCounter,
    in_flight_requests: IntGauge,
}

impl FraudMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("fraud_requests_total", "Total scoring requests by endpoint and status"),
            &["endpoint", "status"],
        )?;
        let request_latency_ms = Histogram::with_opts(
            HistogramOpts::new("fraud_request_latency_ms", "End-to-end request latency in milliseconds")
                .buckets(LATENCY_BUCKETS_MS.to_vec()),
        )?;
        let fraud_score_distribution = Histogram::with_opts(HistogramOpts::new(
            "fraud_score_distribution",
            "Distribution of computed fraud scores",
        ).buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]))?;
        let risk_level_total = IntCounterVec::new(
            Opts::new("fraud_risk_level_total", "Scored transactions by risk level"),
            &["risk_level"],
        )?;
        let recommendation_total = IntCounterVec::new(
            Opts::new("fraud_recommendation_total", "Scored transactions by recommendation"),
            &["recommendation"],
        )?;
        let cache_hits_total = IntCounterVec::new(
            Opts::new("fraud_cache_hits_total", "Cache hits by layer"),
            &["layer"],
        )?;
        let cache_misses_total = IntCounterVec::new(
            Opts::new("fraud_cache_misses_total", "Cache misses by layer"),
            &["layer"],
        )?;
        let rate_limit_hits_total =
            IntCounter::with_opts(Opts::new("fraud_rate_limit_hits_total", "Requests rejected by the rate limiter"))?;
        let rate_limit_fail_open_total = IntCounter::with_opts(Opts::new(
            "fraud_rate_limit_fail_open_total",
            "Rate limiter errors that were allowed through (fail-open)",
        ))?;
        let model_prediction_duration_ms = Histogram::with_opts(
            HistogramOpts::new("fraud_model_prediction_duration_ms", "Model inference duration in milliseconds")
                .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        )?;
        let model_fallback_total = IntCounter::with_opts(Opts::new(
            "fraud_model_fallback_total",
            "Times the rule-based fallback scorer was used instead of the model",
        ))?;
        let feature_extraction_duration_ms = Histogram::with_opts(
            HistogramOpts::new("fraud_feature_extraction_duration_ms", "Feature extraction duration in milliseconds")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 25.0]),
        )?;
        let persistence_query_duration_ms = Histogram::with_opts(HistogramOpts::new(
            "fraud_persistence_query_duration_ms",
            "Persistence gateway query duration in milliseconds",
        ).buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]))?;
        let auth_cache_hits_total = IntCounter::with_opts(Opts::new(
            "fraud_auth_cache_hits_total",
            "API key resolutions served from the in-process cache",
        ))?;
        let auth_cache_misses_total = IntCounter::with_opts(Opts::new(
            "fraud_auth_cache_misses_total",
            "API key resolutions that required a persistence lookup",
        ))?;
        let in_flight_requests = IntGauge::with_opts(Opts::new(
            "fraud_in_flight_requests",
            "Number of scoring requests currently being processed",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_latency_ms.clone()))?;
        registry.register(Box::new(fraud_score_distribution.clone()))?;
        registry.register(Box::new(risk_level_total.clone()))?;
        registry.register(Box::new(recommendation_total.clone()))?;
        registry.register(Box::new(cache_hits_total.clone()))?;
        registry.register(Box::new(cache_misses_total.clone()))?;
        registry.register(Box::new(rate_limit_hits_total.clone()))?;
        registry.register(Box::new(rate_limit_fail_open_total.clone()))?;
        registry.register(Box::new(model_prediction_duration_ms.clone()))?;
        registry.register(Box::new(model_fallback_total.clone()))?;
        registry.register(Box::new(feature_extraction_duration_ms.clone()))?;
        registry.register(Box::new(persistence_query_duration_ms.clone()))?;
        registry.register(Box::new(auth_cache_hits_total.clone()))?;
        registry.register(Box::new(auth_cache_misses_total.clone()))?;
        registry.register(Box::new(in_flight_requests.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_latency_ms,
            fraud_score_distribution,
            risk_level_total,
            recommendation_total,
            cache_hits_total,
            cache_misses_total,
            rate_limit_hits_total,
            rate_limit_fail_open_total,
            model_prediction_duration_ms,
            model_fallback_total,
            feature_extraction_duration_ms,
            persistence_query_duration_ms,
            auth_cache_hits_total,
            auth_cache_misses_total,
            in_flight_requests,
        })
    }

    pub fn record_request(&self, endpoint: &str, status: u16) {
        self.requests_total.with_label_values(&[endpoint, &status.to_string()]).inc();
    }

    pub fn observe_request_latency_ms(&self, ms: f64) {
        self.request_latency_ms.observe(ms);
    }

    pub fn observe_fraud_score(&self, score: f64) {
        self.fraud_score_distribution.observe(score);
    }

    pub fn record_risk_level(&self, risk_level: &str) {
        self.risk_level_total.with_label_values(&[risk_level]).inc();
    }

    pub fn record_recommendation(&self, recommendation: &str) {
        self.recommendation_total.with_label_values(&[recommendation]).inc();
    }

    pub fn record_cache_hit(&self, layer: &str) {
        self.cache_hits_total.with_label_values(&[layer]).inc();
    }

    pub fn record_cache_miss(&self, layer: &str) {
        self.cache_misses_total.with_label_values(&[layer]).inc();
    }

    pub fn record_rate_limit_hit(&self) {
        self.rate_limit_hits_total.inc();
    }

    pub fn record_rate_limit_fail_open(&self) {
        self.rate_limit_fail_open_total.inc();
    }

    pub fn observe_model_prediction_ms(&self, ms: f64) {
        self.model_prediction_duration_ms.observe(ms);
    }

    pub fn record_model_fallback(&self) {
        self.model_fallback_total.inc();
    }

    pub fn observe_feature_extraction_ms(&self, ms: f64) {
        self.feature_extraction_duration_ms.observe(ms);
    }

    pub fn observe_persistence_query_ms(&self, ms: f64) {
        self.persistence_query_duration_ms.observe(ms);
    }

    pub fn record_auth_cache_hit(&self) {
        self.auth_cache_hits_total.inc();
    }

    pub fn record_auth_cache_miss(&self) {
        self.auth_cache_misses_total.inc();
    }

    pub fn inc_in_flight(&self) {
        self.in_flight_requests.inc();
    }

    pub fn dec_in_flight(&self) {
        self.in_flight_requests.dec();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"))
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
