use crate::metrics::FraudMetrics;
use crate::types::ApiKeyRecord;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const API_KEY_LENGTH: usize = 32;
const URL_SAFE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// `SHA256(key || salt)`, hex-encoded. The salt is a process-wide secret;
/// hashes are never reversed, only compared by re-hashing the presented key.
pub fn hash_api_key(key: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a new opaque API key: a fixed prefix followed by
/// `API_KEY_LENGTH` URL-safe characters. Used by out-of-scope admin tooling
/// to mint keys this service's Auth Gate can later resolve.
pub fn generate_api_key(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..API_KEY_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..URL_SAFE_ALPHABET.len());
            URL_SAFE_ALPHABET[idx] as char
        })
        .collect();
    format!("{prefix}{suffix}")
}

struct CacheEntry {
    record: Option<Arc<ApiKeyRecord>>,
    expires_at: Instant,
}

/// Bounded, short-TTL cache in front of the API key lookup. A `None` entry
/// (a hash that doesn't resolve) is cached too, so repeated bad keys don't
/// hammer the persistence layer.
pub struct AuthCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl AuthCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl, max_entries }
    }

    pub async fn get(&self, hash: &str) -> Option<Option<Arc<ApiKeyRecord>>> {
        let entries = self.entries.read().await;
        let entry = entries.get(hash)?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        Some(entry.record.clone())
    }

    pub async fn set(&self, hash: String, record: Option<Arc<ApiKeyRecord>>) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries && !entries.contains_key(&hash) {
            if let Some(k) = entries.keys().next().cloned() {
                entries.remove(&k);
            }
        }
        entries.insert(hash, CacheEntry { record, expires_at: Instant::now() + self.ttl });
    }
}

/// Resolves a presented API key to its tenant record, consulting the bounded
/// cache before falling back to the persistence gateway.
pub async fn resolve_api_key<F, Fut>(
    presented_key: &str,
    salt: &str,
    cache: &AuthCache,
    metrics: &FraudMetrics,
    lookup: F,
) -> Option<Arc<ApiKeyRecord>>
where
    F: FnOnce(String) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<Option<ApiKeyRecord>>>,
{
    let hash = hash_api_key(presented_key, salt);

    if let Some(cached) = cache.get(&hash).await {
        metrics.record_auth_cache_hit();
        return cached;
    }
    metrics.record_auth_cache_miss();

    let started = Instant::now();
    let record = lookup(hash.clone()).await.ok().flatten().map(Arc::new);
    metrics.observe_persistence_query_ms(started.elapsed().as_secs_f64() * 1000.0);
    cache.set(hash, record.clone()).await;
    record
}

/// True only when the key is active and either never expires or has not yet
/// expired.
pub fn is_key_valid(record: &ApiKeyRecord, now: chrono::DateTime<chrono::Utc>) -> bool {
    record.is_active && record.expires_at.map(|exp| exp > now).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_record(is_active: bool, expires_at: Option<chrono::DateTime<Utc>>) -> ApiKeyRecord {
        ApiKeyRecord {
            id: Uuid::new_v4(),
            key_hash: "hash".to_string(),
            name: "test".to_string(),
            tenant_id: Uuid::new_v4(),
            rate_limit: 100,
            is_active,
            request_count: 0,
            last_used_at: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn hash_is_deterministic_for_same_key_and_salt() {
        assert_eq!(hash_api_key("dygsom_abc", "salt1"), hash_api_key("dygsom_abc", "salt1"));
        assert_ne!(hash_api_key("dygsom_abc", "salt1"), hash_api_key("dygsom_abc", "salt2"));
    }

    #[test]
    fn generated_key_has_expected_prefix_and_length() {
        let key = generate_api_key("dygsom_");
        assert!(key.starts_with("dygsom_"));
        assert_eq!(key.len(), "dygsom_".len() + API_KEY_LENGTH);
    }

    #[test]
    fn inactive_key_is_invalid() {
        let record = sample_record(false, None);
        assert!(!is_key_valid(&record, Utc::now()));
    }

    #[test]
    fn expired_key_is_invalid() {
        let record = sample_record(true, Some(Utc::now() - chrono::Duration::hours(1)));
        assert!(!is_key_valid(&record, Utc::now()));
    }

    #[test]
    fn active_unexpiring_key_is_valid() {
        let record = sample_record(true, None);
        assert!(is_key_valid(&record, Utc::now()));
    }

    #[tokio::test]
    async fn auth_cache_respects_ttl() {
        let cache = AuthCache::new(Duration::from_millis(10), 100);
        cache.set("h1".to_string(), None).await;
        assert!(cache.get("h1").await.is_some());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("h1").await.is_none());
    }
}
