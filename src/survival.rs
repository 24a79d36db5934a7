//! Time-decayed survival score used for ranking tie-breaks and corpus pruning.

use chrono::{DateTime, Utc};

/// Added to every q_score so junk-penalized issues still score above zero.
pub const BASE_QUALITY: f64 = 1.0;
/// Days added to the age so a brand-new issue has a finite, bounded score.
pub const GRACE_PERIOD: f64 = 2.0;
/// Decay exponent.
pub const GRAVITY: f64 = 1.5;

/// `(q + BASE_QUALITY) / (days_old + GRACE_PERIOD)^GRAVITY`
///
/// Monotonically decreasing in age for fixed q, increasing in q for fixed
/// age. Negative q values are valid inputs.
pub fn calculate_survival_score(q_score: f64, days_old: f64) -> f64 {
    let denominator = (days_old + GRACE_PERIOD).powf(GRAVITY);
    (q_score + BASE_QUALITY) / denominator
}

/// Fractional days between `dt` and now. Timestamps are UTC throughout.
pub fn days_since(dt: DateTime<Utc>) -> f64 {
    let delta = Utc::now().signed_duration_since(dt);
    delta.num_milliseconds() as f64 / 86_400_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_score_at_age_zero() {
        let score = calculate_survival_score(0.8, 0.0);
        let expected = 1.8 / 2.0_f64.powf(1.5);
        assert!((score - expected).abs() < 1e-9);
        assert!((score - 0.6364).abs() < 1e-3);
    }

    #[test]
    fn test_score_decreases_with_age() {
        let mut prev = calculate_survival_score(0.5, 0.0);
        for days in [1.0, 7.0, 30.0, 365.0] {
            let score = calculate_survival_score(0.5, days);
            assert!(score < prev, "score did not decay at {days} days");
            prev = score;
        }
    }

    #[test]
    fn test_score_increases_with_quality() {
        let low = calculate_survival_score(-0.5, 10.0);
        let mid = calculate_survival_score(0.0, 10.0);
        let high = calculate_survival_score(0.9, 10.0);
        assert!(low < mid && mid < high);
    }

    #[test]
    fn test_score_finite_and_positive() {
        for q in [-0.5, 0.0, 0.9] {
            for days in [0.0, 0.001, 1.0, 10_000.0] {
                let score = calculate_survival_score(q, days);
                assert!(score.is_finite());
                assert!(score > 0.0, "q={q} days={days} gave {score}");
            }
        }
    }

    #[test]
    fn test_days_since_fractional() {
        let twelve_hours_ago = Utc::now() - Duration::hours(12);
        let days = days_since(twelve_hours_ago);
        assert!((days - 0.5).abs() < 0.01, "got {days}");
    }

    #[test]
    fn test_decay_ordering_for_pruning() {
        // The ordering the Janitor relies on: older issues at the same
        // quality always score lower.
        let day1 = calculate_survival_score(0.8, 1.0);
        let day30 = calculate_survival_score(0.8, 30.0);
        assert!(day30 < day1);
    }
}
