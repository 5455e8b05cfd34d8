use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_pool_size: u32,
    pub database_pool_timeout_secs: u64,
    pub redis_url: String,
    pub redis_socket_timeout_secs: u64,
    pub api_key_salt: String,
    pub api_key_prefix: String,
    pub rate_limit_per_minute: u32,
    pub rate_limit_window_secs: u64,
    pub cache_l1_max_size: usize,
    pub cache_velocity_ttl_secs: u64,
    pub cache_ip_history_ttl_secs: u64,
    pub cache_customer_history_ttl_secs: u64,
    pub fraud_score_low_threshold: f64,
    pub fraud_score_medium_threshold: f64,
    pub fraud_score_high_threshold: f64,
    pub fraud_max_tx_per_hour: u32,
    pub fraud_max_tx_per_day: u32,
    pub fraud_max_amount_per_day: f64,
    pub ml_model_path: String,
    pub ml_model_version: String,
    pub ml_prediction_timeout_ms: u64,
    pub api_request_timeout_secs: u64,
    pub api_graceful_shutdown_timeout_secs: u64,
    pub auth_cache_ttl_secs: u64,
    pub auth_cache_max_entries: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| "redis://redis:6379/0".to_string());
        let api_key_salt = env::var("API_KEY_SALT").context("API_KEY_SALT must be set")?;

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_u16("PORT", 3000),
            database_url,
            database_pool_size: env_u32("DATABASE_POOL_SIZE", 10).max(1),
            database_pool_timeout_secs: env_u64("DATABASE_POOL_TIMEOUT_SECONDS", 30).max(1),
            redis_url,
            redis_socket_timeout_secs: env_u64("REDIS_SOCKET_TIMEOUT_SECONDS", 5).max(1),
            api_key_salt,
            api_key_prefix: env::var("API_KEY_PREFIX").unwrap_or_else(|_| "dygsom_".to_string()),
            rate_limit_per_minute: env_u32("RATE_LIMIT_PER_MINUTE", 100).max(1),
            rate_limit_window_secs: env_u64("RATE_LIMIT_WINDOW_SECONDS", 60).max(1),
            cache_l1_max_size: env_u32("CACHE_L1_MAX_SIZE", 2000).max(1) as usize,
            cache_velocity_ttl_secs: env_u64("CACHE_VELOCITY_TTL", 60).max(1),
            cache_ip_history_ttl_secs: env_u64("CACHE_IP_HISTORY_TTL", 300).max(1),
            cache_customer_history_ttl_secs: env_u64("CACHE_CUSTOMER_HISTORY_TTL", 60).max(1),
            fraud_score_low_threshold: env_f64("FRAUD_SCORE_LOW_THRESHOLD", 0.30),
            fraud_score_medium_threshold: env_f64("FRAUD_SCORE_MEDIUM_THRESHOLD", 0.50),
            fraud_score_high_threshold: env_f64("FRAUD_SCORE_HIGH_THRESHOLD", 0.80),
            fraud_max_tx_per_hour: env_u32("FRAUD_MAX_TX_PER_HOUR", 5),
            fraud_max_tx_per_day: env_u32("FRAUD_MAX_TX_PER_DAY", 20),
            fraud_max_amount_per_day: env_f64("FRAUD_MAX_AMOUNT_PER_DAY", 10_000.00),
            ml_model_path: env::var("ML_MODEL_PATH")
                .unwrap_or_else(|_| "ml/models/fraud_model.joblib".to_string()),
            ml_model_version: env::var("ML_MODEL_VERSION")
                .unwrap_or_else(|_| "v2.0.0-xgboost".to_string()),
            ml_prediction_timeout_ms: env_u64("ML_PREDICTION_TIMEOUT_MS", 5000).max(1),
            api_request_timeout_secs: env_u64("API_REQUEST_TIMEOUT_SECONDS", 30).max(1),
            api_graceful_shutdown_timeout_secs: env_u64(
                "API_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS",
                30,
            )
            .max(1),
            auth_cache_ttl_secs: env_u64("AUTH_CACHE_TTL_SECONDS", 5).max(1),
            auth_cache_max_entries: env_u32("AUTH_CACHE_MAX_ENTRIES", 10_000).max(1) as usize,
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
        })
    }
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_u32_falls_back_to_default_on_missing_or_invalid() {
        std::env::remove_var("NONEXISTENT_FRAUD_TEST_VAR");
        assert_eq!(env_u32("NONEXISTENT_FRAUD_TEST_VAR", 42), 42);
    }

    #[test]
    fn env_f64_parses_valid_value() {
        std::env::set_var("FRAUD_TEST_THRESHOLD", "0.42");
        assert_eq!(env_f64("FRAUD_TEST_THRESHOLD", 0.0), 0.42);
        std::env::remove_var("FRAUD_TEST_THRESHOLD");
    }
}
