use crate::types::{ApiKeyRecord, TransactionRecord, ValidatedTransaction};
use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub enum Window {
    OneHour,
    OneDay,
    SevenDays,
}

impl Window {
    fn as_interval(&self) -> &'static str {
        match self {
            Window::OneHour => "1 hour",
            Window::OneDay => "1 day",
            Window::SevenDays => "7 days",
        }
    }
}

/// Typed accessors for transactions and API keys. Every query is expected to
/// complete well within the scoring path's deadline; callers apply their own
/// timeouts via `tokio::time::timeout`.
#[derive(Clone)]
pub struct PersistenceGateway {
    pool: PgPool,
}

impl PersistenceGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(
            r#"SELECT id, key_hash, name, tenant_id, rate_limit, is_active, request_count, last_used_at, expires_at, created_at
               FROM api_keys
               WHERE key_hash = $1
                 AND is_active = true
                 AND (expires_at IS NULL OR expires_at > now())"#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Best-effort usage bump; callers must not fail the request if this
    /// errors.
    pub async fn increment_api_key_usage(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"UPDATE api_keys SET request_count = request_count + 1, last_used_at = now() WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_transaction(
        &self,
        tx: &ValidatedTransaction,
        fraud_score: f64,
        risk_level: &str,
        decision: &str,
    ) -> Result<TransactionRecord> {
        let record = sqlx::query_as::<_, TransactionRecord>(
            r#"INSERT INTO transactions
                 (id, transaction_id, amount, currency, customer_email, customer_phone, customer_ip,
                  payment_type, bin, last4, brand, fraud_score, risk_level, decision, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
               RETURNING id, transaction_id, amount, currency, customer_email, customer_phone, customer_ip,
                         payment_type, bin, last4, brand, fraud_score, risk_level, decision, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(&tx.transaction_id)
        .bind(&tx.amount)
        .bind(&tx.currency)
        .bind(&tx.customer_email)
        .bind(&tx.customer_phone)
        .bind(&tx.customer_ip)
        .bind(&tx.payment_type)
        .bind(&tx.bin)
        .bind(&tx.last4)
        .bind(&tx.brand)
        .bind(fraud_score)
        .bind(risk_level)
        .bind(decision)
        .bind(tx.timestamp)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn customer_tx_count(&self, email: &str, window: Window) -> Result<i64> {
        let interval = window.as_interval();
        let count: i64 = sqlx::query_scalar(&format!(
            r#"SELECT COUNT(*) FROM transactions WHERE customer_email = $1 AND created_at > now() - interval '{interval}'"#
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// A real SQL `SUM`, not a fetch-then-sum-in-memory loop: the amount sum
    /// is computed server-side across every matching row.
    pub async fn customer_amount_sum(&self, email: &str, window: Window) -> Result<BigDecimal> {
        let interval = window.as_interval();
        let sum: Option<BigDecimal> = sqlx::query_scalar(&format!(
            r#"SELECT COALESCE(SUM(amount), 0) FROM transactions WHERE customer_email = $1 AND created_at > now() - interval '{interval}'"#
        ))
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(sum.unwrap_or_else(|| BigDecimal::from(0)))
    }

    pub async fn ip_tx_count(&self, ip: &str, window: Window) -> Result<i64> {
        let interval = window.as_interval();
        let count: i64 = sqlx::query_scalar(&format!(
            r#"SELECT COUNT(*) FROM transactions WHERE customer_ip = $1 AND created_at > now() - interval '{interval}'"#
        ))
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn ready(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

pub fn now_unix_millis(now: DateTime<Utc>) -> i64 {
    now.timestamp_millis()
}
