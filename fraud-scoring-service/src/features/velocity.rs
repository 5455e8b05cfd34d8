use crate::types::VelocityChecks;

pub const NAMES: &[&str] = &[
    "velocity_customer_tx_count_1h",
    "velocity_customer_tx_count_24h",
    "velocity_customer_tx_count_7d",
    "velocity_customer_amount_1h",
    "velocity_customer_amount_24h",
    "velocity_customer_amount_7d",
    "velocity_ip_tx_count_1h",
    "velocity_ip_tx_count_24h",
    "velocity_device_tx_count_1h",
    "velocity_device_tx_count_24h",
];

pub fn extract(v: &VelocityChecks) -> Vec<f64> {
    vec![
        v.customer_tx_count_1h as f64,
        v.customer_tx_count_24h as f64,
        v.customer_tx_count_7d as f64,
        v.customer_amount_sum_1h,
        v.customer_amount_sum_24h,
        v.customer_amount_sum_7d,
        v.ip_tx_count_1h as f64,
        v.ip_tx_count_24h as f64,
        v.device_tx_count_1h as f64,
        v.device_tx_count_24h as f64,
    ]
}
