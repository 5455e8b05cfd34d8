mod amount;
mod categorical;
mod email;
mod time;
mod velocity;

use crate::types::{FeatureVector, ValidatedTransaction, VelocityChecks};

/// Canonical, fixed order of feature names. This is the model's input
/// contract: never reorder, only ever append new groups at the end.
pub fn feature_names() -> Vec<&'static str> {
    let mut names = Vec::with_capacity(41);
    names.extend_from_slice(time::NAMES);
    names.extend_from_slice(amount::NAMES);
    names.extend_from_slice(email::NAMES);
    names.extend_from_slice(velocity::NAMES);
    names.extend_from_slice(categorical::NAMES);
    names
}

/// Pure transform: validated transaction + velocity snapshot -> feature vector.
/// Given the same inputs this always produces a bit-identical vector.
pub fn extract(tx: &ValidatedTransaction, velocity: &VelocityChecks) -> FeatureVector {
    let mut values = Vec::with_capacity(41);
    values.extend(time::extract(tx.timestamp));
    values.extend(amount::extract(&tx.amount));
    values.extend(email::extract(&tx.customer_email));
    values.extend(velocity::extract(velocity));
    values.extend(categorical::extract(tx));
    FeatureVector::new(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_names_length_matches_extracted_vector_length() {
        assert_eq!(feature_names().len(), 41);
    }
}
