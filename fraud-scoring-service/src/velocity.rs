use crate::cache::{bucketed_key, CacheTier};
use crate::metrics::FraudMetrics;
use crate::persistence::{PersistenceGateway, Window};
use crate::types::VelocityChecks;
use anyhow::Result;
use bigdecimal::ToPrimitive;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedVelocityCounts {
    customer_tx_count_1h: i64,
    customer_tx_count_24h: i64,
    customer_tx_count_7d: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedCustomerHistory {
    customer_amount_sum_1h: f64,
    customer_amount_sum_24h: f64,
    customer_amount_sum_7d: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedIpHistory {
    ip_tx_count_1h: i64,
    ip_tx_count_24h: i64,
}

/// Produces the velocity snapshot a scoring request needs, consulting the
/// cache before falling back to the persistence gateway. Never writes
/// transactions; read-only by construction.
///
/// Backs three independent cache namespaces, each with its own TTL:
/// `velocity:` (customer transaction counts), `customer_history:` (customer
/// spend sums), and `ip_history:` (originating-IP transaction counts).
pub struct VelocityAggregator<'a> {
    cache: &'a CacheTier,
    persistence: &'a PersistenceGateway,
    metrics: &'a FraudMetrics,
    velocity_ttl_secs: u64,
    ip_history_ttl_secs: u64,
    customer_history_ttl_secs: u64,
}

impl<'a> VelocityAggregator<'a> {
    pub fn new(
        cache: &'a CacheTier,
        persistence: &'a PersistenceGateway,
        metrics: &'a FraudMetrics,
        velocity_ttl_secs: u64,
        ip_history_ttl_secs: u64,
        customer_history_ttl_secs: u64,
    ) -> Self {
        Self { cache, persistence, metrics, velocity_ttl_secs, ip_history_ttl_secs, customer_history_ttl_secs }
    }

    pub async fn snapshot(&self, email: &str, ip: &str) -> Result<VelocityChecks> {
        let now = Utc::now().timestamp();
        let velocity_key = bucketed_key("velocity", email, self.velocity_ttl_secs, now);
        let history_key = bucketed_key("customer_history", email, self.customer_history_ttl_secs, now);
        let ip_key = bucketed_key("ip_history", ip, self.ip_history_ttl_secs, now);

        let counts = match self.cache.get::<CachedVelocityCounts>(&velocity_key).await {
            Some(cached) => cached,
            None => {
                let computed = self.compute_customer_counts(email).await?;
                self.cache.set(&velocity_key, &computed, self.velocity_ttl_secs).await;
                computed
            }
        };

        let history = match self.cache.get::<CachedCustomerHistory>(&history_key).await {
            Some(cached) => cached,
            None => {
                let computed = self.compute_customer_history(email).await?;
                self.cache.set(&history_key, &computed, self.customer_history_ttl_secs).await;
                computed
            }
        };

        let ip_history = match self.cache.get::<CachedIpHistory>(&ip_key).await {
            Some(cached) => cached,
            None => {
                let computed = self.compute_ip_history(ip).await?;
                self.cache.set(&ip_key, &computed, self.ip_history_ttl_secs).await;
                computed
            }
        };

        Ok(VelocityChecks {
            customer_tx_count_1h: counts.customer_tx_count_1h,
            customer_tx_count_24h: counts.customer_tx_count_24h,
            customer_tx_count_7d: counts.customer_tx_count_7d,
            customer_amount_sum_1h: history.customer_amount_sum_1h,
            customer_amount_sum_24h: history.customer_amount_sum_24h,
            customer_amount_sum_7d: history.customer_amount_sum_7d,
            ip_tx_count_1h: ip_history.ip_tx_count_1h,
            ip_tx_count_24h: ip_history.ip_tx_count_24h,
            // No device identifier is collected by the validated transaction
            // schema, so device velocity is always zero.
            device_tx_count_1h: 0,
            device_tx_count_24h: 0,
        })
    }

    async fn compute_customer_counts(&self, email: &str) -> Result<CachedVelocityCounts> {
        let started = Instant::now();
        let (count_1h, count_24h, count_7d) = tokio::try_join!(
            self.persistence.customer_tx_count(email, Window::OneHour),
            self.persistence.customer_tx_count(email, Window::OneDay),
            self.persistence.customer_tx_count(email, Window::SevenDays),
        )?;
        self.metrics.observe_persistence_query_ms(started.elapsed().as_secs_f64() * 1000.0);

        Ok(CachedVelocityCounts {
            customer_tx_count_1h: count_1h,
            customer_tx_count_24h: count_24h,
            customer_tx_count_7d: count_7d,
        })
    }

    async fn compute_customer_history(&self, email: &str) -> Result<CachedCustomerHistory> {
        let started = Instant::now();
        let (sum_1h, sum_24h, sum_7d) = tokio::try_join!(
            self.persistence.customer_amount_sum(email, Window::OneHour),
            self.persistence.customer_amount_sum(email, Window::OneDay),
            self.persistence.customer_amount_sum(email, Window::SevenDays),
        )?;
        self.metrics.observe_persistence_query_ms(started.elapsed().as_secs_f64() * 1000.0);

        Ok(CachedCustomerHistory {
            customer_amount_sum_1h: sum_1h.to_f64().unwrap_or(0.0),
            customer_amount_sum_24h: sum_24h.to_f64().unwrap_or(0.0),
            customer_amount_sum_7d: sum_7d.to_f64().unwrap_or(0.0),
        })
    }

    async fn compute_ip_history(&self, ip: &str) -> Result<CachedIpHistory> {
        let started = Instant::now();
        let (count_1h, count_24h) = tokio::try_join!(
            self.persistence.ip_tx_count(ip, Window::OneHour),
            self.persistence.ip_tx_count(ip, Window::OneDay),
        )?;
        self.metrics.observe_persistence_query_ms(started.elapsed().as_secs_f64() * 1000.0);
        Ok(CachedIpHistory { ip_tx_count_1h: count_1h, ip_tx_count_24h: count_24h })
    }
}
