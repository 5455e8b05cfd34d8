use bigdecimal::BigDecimal;

pub const NAMES: &[&str] = &[
    "amount",
    "amount_log",
    "amount_rounded",
    "amount_decimal_places",
    "is_high_value",
    "is_very_high_value",
    "amount_percentile",
];

const PERCENTILE_THRESHOLDS: &[f64] = &[10.0, 25.0, 50.0, 100.0, 200.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0];

fn decimal_places(amount: f64) -> u32 {
    let formatted = format!("{amount:.2}");
    match formatted.split('.').nth(1) {
        Some(frac) => frac.trim_end_matches('0').len() as u32,
        None => 0,
    }
}

fn amount_percentile(amount: f64) -> f64 {
    let mut percentile = 0.0;
    for (i, threshold) in PERCENTILE_THRESHOLDS.iter().enumerate() {
        if amount >= *threshold {
            percentile = ((i + 1) * 10) as f64;
        }
    }
    percentile
}

pub fn extract(amount: &BigDecimal) -> Vec<f64> {
    let raw: f64 = crate::validation::amount_as_f64(amount).abs();
    let amount_log = (1.0 + raw).ln();
    let places = decimal_places(raw);
    let is_rounded = places == 0 && (raw % 10.0 == 0.0 || raw % 100.0 == 0.0 || raw % 1000.0 == 0.0);
    let is_high_value = raw > 1000.0;
    let is_very_high_value = raw > 5000.0;

    vec![
        raw,
        amount_log,
        is_rounded as u8 as f64,
        places as f64,
        is_high_value as u8 as f64,
        is_very_high_value as u8 as f64,
        amount_percentile(raw),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rounded_thousand_amount_is_flagged_rounded_and_high_value() {
        let amount = BigDecimal::from_str("5000.00").unwrap();
        let v = extract(&amount);
        let is_rounded_idx = NAMES.iter().position(|n| *n == "amount_rounded").unwrap();
        let is_very_high_idx = NAMES.iter().position(|n| *n == "is_very_high_value").unwrap();
        assert_eq!(v[is_rounded_idx], 1.0);
        assert_eq!(v[is_very_high_idx], 0.0); // not strictly > 5000
    }

    #[test]
    fn percentile_monotonic_for_increasing_amounts() {
        assert!(amount_percentile(5.0) <= amount_percentile(50.0));
        assert!(amount_percentile(50.0) <= amount_percentile(20000.0));
        assert_eq!(amount_percentile(20000.0), 100.0);
    }

    #[test]
    fn non_rounded_amount_has_nonzero_decimal_places() {
        let amount = BigDecimal::from_str("150.55").unwrap();
        let v = extract(&amount);
        let places_idx = NAMES.iter().position(|n| *n == "amount_decimal_places").unwrap();
        assert_eq!(v[places_idx], 2.0);
    }
}
