use bigdecimal::BigDecimal;
use fraud_scoring_service::decision::decide;
use fraud_scoring_service::features;
use fraud_scoring_service::model::fallback_predict;
use fraud_scoring_service::types::{CreateTransactionRequest, CustomerData, PaymentMethodData, VelocityChecks};
use fraud_scoring_service::validation::validate_transaction;
use std::str::FromStr;

fn zero_velocity() -> VelocityChecks {
    VelocityChecks {
        customer_tx_count_1h: 0,
        customer_tx_count_24h: 0,
        customer_tx_count_7d: 0,
        customer_amount_sum_1h: 0.0,
        customer_amount_sum_24h: 0.0,
        customer_amount_sum_7d: 0.0,
        ip_tx_count_1h: 0,
        ip_tx_count_24h: 0,
        device_tx_count_1h: 0,
        device_tx_count_24h: 0,
    }
}

fn base_request() -> CreateTransactionRequest {
    CreateTransactionRequest {
        transaction_id: "txn_scenario_1".to_string(),
        amount: BigDecimal::from_str("150.50").unwrap(),
        currency: "PEN".to_string(),
        timestamp: None,
        customer: CustomerData {
            email: "juan.perez@gmail.com".to_string(),
            phone: "999123456".to_string(),
            ip_address: "181.67.45.123".to_string(),
        },
        payment_method: PaymentMethodData {
            payment_type: "credit_card".to_string(),
            bin: "411111".to_string(),
            last4: "1111".to_string(),
            brand: "visa".to_string(),
        },
    }
}

/// Scenario 1: a low-value, gmail, daytime transaction from a normal
/// customer should be approved with a low fraud score.
#[test]
fn low_risk_transaction_is_approved() {
    let tx = validate_transaction(base_request()).expect("request should validate");
    let velocity = zero_velocity();
    let prediction = fallback_predict(&tx, &velocity);
    let (risk_level, recommendation) = decide(prediction.probability, 0.30, 0.50, 0.80);

    assert!(prediction.probability < 0.30, "expected a low fraud score, got {}", prediction.probability);
    assert_eq!(risk_level.as_str(), "LOW");
    assert_eq!(recommendation.as_str(), "APPROVE");
}

/// Scenario 3: a private IP address must be rejected at validation, before
/// any scoring work happens.
#[test]
fn private_ip_is_rejected_at_validation() {
    let mut request = base_request();
    request.customer.ip_address = "10.0.0.1".to_string();
    let err = validate_transaction(request).unwrap_err();
    assert!(matches!(err, fraud_scoring_service::validation::ValidationError::Ip(_)));
}

/// Scenario 5: with no model loaded, a disposable-email, high-value
/// transaction should score high enough to land in HIGH or CRITICAL via the
/// rule-based fallback (30 for very-high-value + 25 for disposable = 55).
#[test]
fn model_fallback_flags_disposable_high_value_transaction() {
    let mut request = base_request();
    request.amount = BigDecimal::from_str("7500").unwrap();
    request.customer.email = "throwaway@tempmail.com".to_string();
    let tx = validate_transaction(request).expect("request should validate");

    let prediction = fallback_predict(&tx, &zero_velocity());
    assert!(prediction.probability >= 0.55);
    assert!(!prediction.model_used);

    let (risk_level, _) = decide(prediction.probability, 0.30, 0.50, 0.80);
    assert!(matches!(risk_level.as_str(), "HIGH" | "CRITICAL"));
}

/// Scenario 6: a customer with heavy recent activity should see that
/// activity reflected verbatim in the velocity feature slots.
#[test]
fn velocity_amplification_is_reflected_in_feature_vector() {
    let tx = validate_transaction(base_request()).expect("request should validate");
    let mut velocity = zero_velocity();
    velocity.customer_tx_count_1h = 12;
    velocity.customer_tx_count_24h = 12;

    let vector = features::extract(&tx, &velocity);
    let names = features::feature_names();
    let idx = names.iter().position(|n| *n == "velocity_customer_tx_count_1h").unwrap();
    assert_eq!(vector.as_slice()[idx], 12.0);
}

/// Feature stability: identical input and velocity snapshot must produce a
/// bit-identical feature vector across repeated calls.
#[test]
fn feature_extraction_is_deterministic() {
    let tx = validate_transaction(base_request()).expect("request should validate");
    let velocity = zero_velocity();

    let first = features::extract(&tx, &velocity);
    let second = features::extract(&tx, &velocity);
    assert_eq!(first, second);
}
