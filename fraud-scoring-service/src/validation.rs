use crate::types::{CreateTransactionRequest, ValidatedTransaction};
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::Utc;
use common_money::normalize_scale;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("valid email regex"));
static TRANSACTION_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid transaction id regex"));
static PHONE_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-()+]").expect("valid phone strip regex"));

const VALID_CURRENCIES: &[&str] = &["PEN", "USD"];
const VALID_PAYMENT_TYPES: &[&str] = &["credit_card", "debit_card"];
const VALID_BRANDS: &[&str] = &["visa", "mastercard", "amex", "discover", "diners", "jcb"];

const AMOUNT_MIN: &str = "1.00";
const AMOUNT_MAX: &str = "1000000.00";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("transaction_id must be 3-100 characters of letters, digits, underscore or hyphen")]
    TransactionId,
    #[error("amount must be between {AMOUNT_MIN} and {AMOUNT_MAX}")]
    AmountRange,
    #[error("currency must be one of PEN, USD")]
    Currency,
    #[error("invalid email address")]
    Email,
    #[error("phone number must contain 8-15 digits")]
    Phone,
    #[error("{0}")]
    Ip(String),
    #[error("payment type must be one of credit_card, debit_card")]
    PaymentType,
    #[error("bin must be exactly 6 digits")]
    Bin,
    #[error("last4 must be exactly 4 digits")]
    Last4,
    #[error("brand must be one of visa, mastercard, amex, discover, diners, jcb")]
    Brand,
}

pub fn validate_transaction(
    req: CreateTransactionRequest,
) -> Result<ValidatedTransaction, ValidationError> {
    let transaction_id = req.transaction_id.trim().to_string();
    if transaction_id.len() < 3
        || transaction_id.len() > 100
        || !TRANSACTION_ID_RE.is_match(&transaction_id)
    {
        return Err(ValidationError::TransactionId);
    }

    let amount = normalize_scale(&req.amount);
    let min = BigDecimal::from_str(AMOUNT_MIN).expect("valid constant");
    let max = BigDecimal::from_str(AMOUNT_MAX).expect("valid constant");
    if amount < min || amount > max {
        return Err(ValidationError::AmountRange);
    }

    let currency = req.currency.trim().to_uppercase();
    if !VALID_CURRENCIES.contains(&currency.as_str()) {
        return Err(ValidationError::Currency);
    }

    let email = req.customer.email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::Email);
    }

    let phone_digits = PHONE_STRIP_RE.replace_all(req.customer.phone.trim(), "").to_string();
    let digit_count = phone_digits.chars().filter(|c| c.is_ascii_digit()).count();
    if digit_count < 8 || digit_count > 15 {
        return Err(ValidationError::Phone);
    }

    let customer_ip = validate_ipv4(req.customer.ip_address.trim())?;

    let payment_type = req.payment_method.payment_type.trim().to_lowercase();
    if !VALID_PAYMENT_TYPES.contains(&payment_type.as_str()) {
        return Err(ValidationError::PaymentType);
    }

    let bin = req.payment_method.bin.trim().to_string();
    if bin.len() != 6 || !bin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Bin);
    }

    let last4 = req.payment_method.last4.trim().to_string();
    if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Last4);
    }

    let brand_lower = req.payment_method.brand.trim().to_lowercase();
    if !VALID_BRANDS.contains(&brand_lower.as_str()) {
        return Err(ValidationError::Brand);
    }
    let brand = title_case(&brand_lower);

    Ok(ValidatedTransaction {
        transaction_id,
        amount,
        currency,
        timestamp: req.timestamp.unwrap_or_else(Utc::now),
        customer_email: email,
        customer_phone: phone_digits,
        customer_ip,
        payment_type,
        bin,
        last4,
        brand,
    })
}

/// Accepts a well-formed public IPv4 address; rejects the RFC1918 private
/// ranges, loopback, and anything that isn't four dotted octets 0-255.
fn validate_ipv4(ip: &str) -> Result<String, ValidationError> {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(ValidationError::Ip("invalid IPv4 address".to_string()));
    }
    let mut parts = [0u8; 4];
    for (i, part) in octets.iter().enumerate() {
        let value: u16 = part.parse().map_err(|_| ValidationError::Ip("invalid IPv4 address".to_string()))?;
        if value > 255 {
            return Err(ValidationError::Ip("invalid IPv4 address".to_string()));
        }
        parts[i] = value as u8;
    }

    if parts[0] == 10 {
        return Err(ValidationError::Ip("private IP addresses (10.0.0.0/8) are not allowed".to_string()));
    }
    if parts[0] == 172 && (16..=31).contains(&parts[1]) {
        return Err(ValidationError::Ip("private IP addresses (172.16.0.0/12) are not allowed".to_string()));
    }
    if parts[0] == 192 && parts[1] == 168 {
        return Err(ValidationError::Ip("private IP addresses (192.168.0.0/16) are not allowed".to_string()));
    }
    if parts[0] == 127 {
        return Err(ValidationError::Ip("loopback IP addresses (127.0.0.0/8) are not allowed".to_string()));
    }

    Ok(ip.to_string())
}

fn title_case(lower: &str) -> String {
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Rounds an already-validated amount to its `f64` representation for feature
/// extraction. Persistence keeps the exact `BigDecimal`.
pub fn amount_as_f64(amount: &BigDecimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}
