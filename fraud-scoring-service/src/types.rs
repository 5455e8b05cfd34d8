use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Approve,
    Review,
    Decline,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Approve => "APPROVE",
            Recommendation::Review => "REVIEW",
            Recommendation::Decline => "DECLINE",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerData {
    pub email: String,
    pub phone: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodData {
    #[serde(rename = "type")]
    pub payment_type: String,
    pub bin: String,
    pub last4: String,
    pub brand: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTransactionRequest {
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub customer: CustomerData,
    pub payment_method: PaymentMethodData,
}

/// A transaction whose fields have all passed validation and been normalized
/// (lowercased email, stripped phone, rounded amount, title-cased brand).
#[derive(Debug, Clone)]
pub struct ValidatedTransaction {
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub timestamp: DateTime<Utc>,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_ip: String,
    pub payment_type: String,
    pub bin: String,
    pub last4: String,
    pub brand: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VelocityChecks {
    pub customer_tx_count_1h: i64,
    pub customer_tx_count_24h: i64,
    pub customer_tx_count_7d: i64,
    pub customer_amount_sum_1h: f64,
    pub customer_amount_sum_24h: f64,
    pub customer_amount_sum_7d: f64,
    pub ip_tx_count_1h: i64,
    pub ip_tx_count_24h: i64,
    pub device_tx_count_1h: i64,
    pub device_tx_count_24h: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    pub amount: BigDecimal,
    pub currency: String,
    pub customer_email: String,
    pub velocity_checks: VelocityChecks,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub transaction_id: Uuid,
    pub fraud_score: f64,
    pub risk_level: &'static str,
    pub recommendation: &'static str,
    pub processing_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub details: TransactionDetails,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_ip: String,
    pub payment_type: String,
    pub bin: String,
    pub last4: String,
    pub brand: String,
    pub fraud_score: f64,
    pub risk_level: String,
    pub decision: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub key_hash: String,
    pub name: String,
    pub tenant_id: Uuid,
    pub rate_limit: i32,
    pub is_active: bool,
    pub request_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The fixed-order, fixed-cardinality numeric feature vector produced by the
/// feature extractor. Field order is the model's input contract and must
/// never be reordered once a model has been trained against it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelPrediction {
    pub probability: f64,
    pub prediction: i32,
    pub confidence: Confidence,
    pub model_used: bool,
}
