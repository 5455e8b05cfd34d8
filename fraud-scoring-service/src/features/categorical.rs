use crate::types::ValidatedTransaction;

pub const NAMES: &[&str] = &[
    "currency_PEN",
    "currency_USD",
    "payment_credit_card",
    "payment_debit_card",
    "payment_digital_wallet",
    "merchant_retail",
    "merchant_ecommerce",
    "merchant_services",
];

/// One-hot indicators. `payment_digital_wallet` and the `merchant_*` group
/// are always 0: the validated transaction schema carries neither a digital
/// wallet payment type nor a merchant category, so these slots exist only to
/// keep the feature contract aligned with a model trained on the richer
/// upstream schema.
pub fn extract(tx: &ValidatedTransaction) -> Vec<f64> {
    vec![
        (tx.currency == "PEN") as u8 as f64,
        (tx.currency == "USD") as u8 as f64,
        (tx.payment_type == "credit_card") as u8 as f64,
        (tx.payment_type == "debit_card") as u8 as f64,
        0.0,
        0.0,
        0.0,
        0.0,
    ]
}
