use crate::types::{Recommendation, RiskLevel};

/// The HIGH band's internal review/decline split is not exposed as an
/// environment variable; only the three band boundaries below it are
/// configurable.
const HIGH_DECLINE_SPLIT: f64 = 0.70;

/// Sole source of truth for mapping a fraud probability to a risk level and
/// recommendation. Every other place in the codebase that needs this
/// mapping calls through here rather than re-deriving it. `low`/`medium`/
/// `high` are the configured `FRAUD_SCORE_{LOW,MEDIUM,HIGH}_THRESHOLD`
/// values, so operators can move the band boundaries without a code change.
pub fn decide(fraud_score: f64, low: f64, medium: f64, high: f64) -> (RiskLevel, Recommendation) {
    if fraud_score < low {
        (RiskLevel::Low, Recommendation::Approve)
    } else if fraud_score < medium {
        (RiskLevel::Medium, Recommendation::Review)
    } else if fraud_score < HIGH_DECLINE_SPLIT {
        (RiskLevel::High, Recommendation::Review)
    } else if fraud_score < high {
        (RiskLevel::High, Recommendation::Decline)
    } else {
        (RiskLevel::Critical, Recommendation::Decline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: f64 = 0.30;
    const MEDIUM: f64 = 0.50;
    const HIGH: f64 = 0.80;

    #[test]
    fn boundaries_match_the_decision_table() {
        assert_eq!(decide(0.0, LOW, MEDIUM, HIGH).0.as_str(), "LOW");
        assert_eq!(decide(0.29, LOW, MEDIUM, HIGH).0.as_str(), "LOW");
        assert_eq!(decide(0.30, LOW, MEDIUM, HIGH).0.as_str(), "MEDIUM");
        assert_eq!(decide(0.49, LOW, MEDIUM, HIGH).0.as_str(), "MEDIUM");
        assert_eq!(decide(0.50, LOW, MEDIUM, HIGH).0.as_str(), "HIGH");
        assert_eq!(decide(0.50, LOW, MEDIUM, HIGH).1.as_str(), "REVIEW");
        assert_eq!(decide(0.69, LOW, MEDIUM, HIGH).1.as_str(), "REVIEW");
        assert_eq!(decide(0.70, LOW, MEDIUM, HIGH).0.as_str(), "HIGH");
        assert_eq!(decide(0.70, LOW, MEDIUM, HIGH).1.as_str(), "DECLINE");
        assert_eq!(decide(0.79, LOW, MEDIUM, HIGH).1.as_str(), "DECLINE");
        assert_eq!(decide(0.80, LOW, MEDIUM, HIGH).0.as_str(), "CRITICAL");
        assert_eq!(decide(1.0, LOW, MEDIUM, HIGH).0.as_str(), "CRITICAL");
    }

    #[test]
    fn decision_is_monotonic_with_score() {
        let ordering = |r: RiskLevel| match r {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        };
        let scores = [0.0, 0.1, 0.3, 0.4, 0.5, 0.6, 0.7, 0.75, 0.8, 0.95];
        let mut prev = -1;
        for s in scores {
            let (level, _) = decide(s, LOW, MEDIUM, HIGH);
            let rank = ordering(level);
            assert!(rank >= prev);
            prev = rank;
        }
    }

    #[test]
    fn configured_thresholds_move_the_band_boundaries() {
        // A stricter LOW threshold should push a borderline score into MEDIUM.
        assert_eq!(decide(0.15, 0.10, MEDIUM, HIGH).0.as_str(), "MEDIUM");
        assert_eq!(decide(0.15, LOW, MEDIUM, HIGH).0.as_str(), "LOW");
    }
}
