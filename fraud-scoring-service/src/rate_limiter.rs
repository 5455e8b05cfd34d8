use anyhow::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub current: i64,
    pub limit: u32,
}

impl RateDecision {
    pub fn remaining(&self) -> i64 {
        (self.limit as i64 - self.current).max(0)
    }
}

#[async_trait]
pub trait RateLimiterEngine: Send + Sync {
    /// True sliding-window check: evicts entries older than `window`, counts
    /// what remains, and — if under `limit` — records `now` as a new entry.
    async fn check(&self, key: &str, limit: u32, window_secs: u64, now_unix_ms: i64) -> Result<RateDecision>;
}

/// Redis sorted-set sliding window. Each member is a unique token (the
/// timestamp plus a random tiebreaker to avoid collisions under high
/// concurrency); the score is the timestamp in milliseconds. On any Redis
/// error the caller is expected to fail open.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    prefix: String,
}

impl RedisRateLimiter {
    pub async fn new(redis_url: &str, prefix: String) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager, prefix })
    }
}

#[async_trait]
impl RateLimiterEngine for RedisRateLimiter {
    async fn check(&self, key: &str, limit: u32, window_secs: u64, now_unix_ms: i64) -> Result<RateDecision> {
        let redis_key = format!("{}:{}", self.prefix, key);
        let mut conn = self.manager.clone();
        let window_ms = (window_secs * 1000) as i64;
        let cutoff = now_unix_ms - window_ms;

        let _: i64 = conn.zrembyscore(&redis_key, 0, cutoff).await?;
        let current: i64 = conn.zcard(&redis_key).await?;

        if current >= limit as i64 {
            return Ok(RateDecision { allowed: false, current, limit });
        }

        let member = format!("{now_unix_ms}-{}", rand::random::<u32>());
        let _: i64 = conn.zadd(&redis_key, member, now_unix_ms).await?;
        let _: bool = conn.expire(&redis_key, (window_secs + 10) as i64).await?;

        Ok(RateDecision { allowed: true, current: current + 1, limit })
    }
}

/// In-memory fallback used by tests and as a degraded mode; same sliding
/// window semantics without the Redis round-trip.
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    inner: Arc<Mutex<HashMap<String, Vec<i64>>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl Default for InMemoryRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiterEngine for InMemoryRateLimiter {
    async fn check(&self, key: &str, limit: u32, window_secs: u64, now_unix_ms: i64) -> Result<RateDecision> {
        let mut guard = self.inner.lock().await;
        let window_ms = (window_secs * 1000) as i64;
        let cutoff = now_unix_ms - window_ms;
        let entries = guard.entry(key.to_string()).or_default();
        entries.retain(|&ts| ts > cutoff);

        let current = entries.len() as i64;
        if current >= limit as i64 {
            return Ok(RateDecision { allowed: false, current, limit });
        }
        entries.push(now_unix_ms);
        Ok(RateDecision { allowed: true, current: current + 1, limit })
    }
}

/// Wraps a `RateLimiterEngine` with the fail-open policy: any error from the
/// underlying store allows the request through, logs, and increments a
/// metric rather than rejecting the caller.
pub struct FailOpenRateLimiter<E: RateLimiterEngine> {
    engine: E,
}

impl<E: RateLimiterEngine> FailOpenRateLimiter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub async fn check(
        &self,
        key: &str,
        limit: u32,
        window_secs: u64,
        now_unix_ms: i64,
        metrics: &crate::metrics::FraudMetrics,
    ) -> RateDecision {
        match self.engine.check(key, limit, window_secs, now_unix_ms).await {
            Ok(decision) => {
                if !decision.allowed {
                    metrics.record_rate_limit_hit();
                }
                decision
            }
            Err(err) => {
                warn!(error = %err, key, "rate limiter check failed, failing open");
                metrics.record_rate_limit_fail_open();
                RateDecision { allowed: true, current: 0, limit }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_limiter_allows_up_to_limit_then_denies() {
        let limiter = InMemoryRateLimiter::new();
        for i in 0..5 {
            let decision = limiter.check("key1", 5, 60, 1_000 + i).await.unwrap();
            assert!(decision.allowed, "request {i} should be allowed");
        }
        let sixth = limiter.check("key1", 5, 60, 1_005).await.unwrap();
        assert!(!sixth.allowed);
    }

    #[tokio::test]
    async fn in_memory_limiter_evicts_entries_outside_the_window() {
        let limiter = InMemoryRateLimiter::new();
        for i in 0..5 {
            limiter.check("key1", 5, 60, i).await.unwrap();
        }
        // far beyond the 60s (60_000ms) window
        let decision = limiter.check("key1", 5, 60, 100_000).await.unwrap();
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn remaining_is_non_increasing_within_a_window() {
        let limiter = InMemoryRateLimiter::new();
        let mut prev_remaining = i64::MAX;
        for i in 0..5 {
            let decision = limiter.check("key1", 5, 60, i).await.unwrap();
            assert!(decision.remaining() <= prev_remaining);
            prev_remaining = decision.remaining();
        }
    }
}
