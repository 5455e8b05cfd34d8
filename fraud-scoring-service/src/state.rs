use crate::auth::AuthCache;
use crate::cache::CacheTier;
use crate::config::Config;
use crate::metrics::FraudMetrics;
use crate::model::ModelManager;
use crate::persistence::PersistenceGateway;
use crate::rate_limiter::{FailOpenRateLimiter, RedisRateLimiter};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub persistence: Arc<PersistenceGateway>,
    pub cache: Arc<CacheTier>,
    pub rate_limiter: Arc<FailOpenRateLimiter<RedisRateLimiter>>,
    pub auth_cache: Arc<AuthCache>,
    pub metrics: Arc<FraudMetrics>,
    pub model: Arc<ModelManager>,
}

impl AppState {
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let metrics = Arc::new(FraudMetrics::new()?);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database_pool_size)
            .acquire_timeout(Duration::from_secs(config.database_pool_timeout_secs))
            .connect(&config.database_url)
            .await?;
        let persistence = Arc::new(PersistenceGateway::new(pool));

        let cache = Arc::new(
            CacheTier::new(&config.redis_url, config.cache_l1_max_size, metrics.clone()).await?,
        );

        let rate_limiter_engine =
            RedisRateLimiter::new(&config.redis_url, "fraud:rate".to_string()).await?;
        let rate_limiter = Arc::new(FailOpenRateLimiter::new(rate_limiter_engine));

        let auth_cache = Arc::new(AuthCache::new(
            Duration::from_secs(config.auth_cache_ttl_secs),
            config.auth_cache_max_entries,
        ));

        let model = Arc::new(ModelManager::load(&config.ml_model_path, &config.ml_model_version));

        Ok(Self { config, persistence, cache, rate_limiter, auth_cache, metrics, model })
    }
}
