use crate::metrics::FraudMetrics;
use anyhow::Result;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

const MAX_KEY_LEN: usize = 250;

struct L1Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache bounded by entry count, evicted oldest-inserted-first
/// when full. Backed by a plain `HashMap` plus an insertion-order queue,
/// mirroring the hand-rolled dict eviction this system's cache layer has
/// always used rather than reaching for an external LRU crate.
struct L1Cache {
    entries: HashMap<String, L1Entry>,
    order: Vec<String>,
    max_size: usize,
}

impl L1Cache {
    fn new(max_size: usize) -> Self {
        Self { entries: HashMap::new(), order: Vec::new(), max_size }
    }

    fn get(&mut self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if entry.expires_at <= Instant::now() {
            self.entries.remove(key);
            self.order.retain(|k| k != key);
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&mut self, key: &str, value: String, ttl: Duration) {
        if !self.entries.contains_key(key) {
            if self.entries.len() >= self.max_size {
                if let Some(oldest) = self.order.first().cloned() {
                    self.entries.remove(&oldest);
                    self.order.remove(0);
                }
            }
            self.order.push(key.to_string());
        }
        self.entries.insert(key.to_string(), L1Entry { value, expires_at: Instant::now() + ttl });
    }
}

/// Two-tier cache: in-process L1 (fast, small, per-process) backed by a
/// shared Redis L2 (slower, authoritative across instances). A miss in L1
/// that hits in L2 back-fills L1.
#[derive(Clone)]
pub struct CacheTier {
    l1: Arc<Mutex<L1Cache>>,
    redis: ConnectionManager,
    metrics: Arc<FraudMetrics>,
}

impl CacheTier {
    pub async fn new(redis_url: &str, l1_max_size: usize, metrics: Arc<FraudMetrics>) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self { l1: Arc::new(Mutex::new(L1Cache::new(l1_max_size))), redis, metrics })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = storage_key(key);

        {
            let mut l1 = self.l1.lock().await;
            if let Some(raw) = l1.get(&storage_key) {
                self.metrics.record_cache_hit("l1");
                return serde_json::from_str(&raw).ok();
            }
        }
        self.metrics.record_cache_miss("l1");

        let mut conn = self.redis.clone();
        let raw: Option<String> = match conn.get(&storage_key).await {
            Ok(v) => v,
            Err(err) => {
                warn!(error = %err, key = %storage_key, "cache L2 read failed, treating as miss");
                None
            }
        };

        match raw {
            Some(raw) => {
                self.metrics.record_cache_hit("l2");
                serde_json::from_str(&raw).ok()
            }
            None => {
                self.metrics.record_cache_miss("l2");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let storage_key = storage_key(key);
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, key = %storage_key, "failed to serialize cache value, skipping write");
                return;
            }
        };

        {
            let mut l1 = self.l1.lock().await;
            l1.set(&storage_key, raw.clone(), Duration::from_secs(ttl_secs));
        }

        let mut conn = self.redis.clone();
        let _: Result<(), _> = conn.set_ex(&storage_key, raw, ttl_secs).await;
    }

    pub async fn ping(&self) -> bool {
        let mut conn = self.redis.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await.is_ok()
    }
}

/// Keys longer than 250 characters are hashed down so they remain valid and
/// bounded Redis keys.
fn storage_key(key: &str) -> String {
    if key.len() <= MAX_KEY_LEN {
        return key.to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("hashed:{}", hex::encode(hasher.finalize()))
}

/// Bucketed cache key: `{prefix}:{identifier}:{bucket}` where the bucket is
/// the current time divided into `bucket_secs`-wide windows. Readers and
/// writers share a key only while inside the same bucket, which bounds
/// staleness without requiring active invalidation.
pub fn bucketed_key(prefix: &str, identifier: &str, bucket_secs: u64, now_unix: i64) -> String {
    let bucket = now_unix / bucket_secs as i64;
    format!("{prefix}:{identifier}:{bucket}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucketed_key_is_stable_within_a_bucket_and_changes_across_buckets() {
        let a = bucketed_key("velocity", "a@example.com", 60, 1000);
        let b = bucketed_key("velocity", "a@example.com", 60, 1059);
        let c = bucketed_key("velocity", "a@example.com", 60, 1061);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn long_keys_are_hashed_down() {
        let long = "x".repeat(300);
        let key = storage_key(&long);
        assert!(key.len() < 300);
        assert!(key.starts_with("hashed:"));
    }

    #[test]
    fn l1_cache_evicts_oldest_entry_first_when_full() {
        let mut l1 = L1Cache::new(2);
        l1.set("a", "1".into(), Duration::from_secs(60));
        l1.set("b", "2".into(), Duration::from_secs(60));
        l1.set("c", "3".into(), Duration::from_secs(60));
        assert!(l1.get("a").is_none());
        assert!(l1.get("b").is_some());
        assert!(l1.get("c").is_some());
    }
}
